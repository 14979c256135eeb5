// conform-core/src/domain/analytic/validate.rs

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};
use validator::Validate;

use super::config::AnalyticConfig;
use crate::domain::error::DomainError;
use crate::domain::reference::ReferenceCatalog;
use crate::domain::rules::RuleRegistry;

impl AnalyticConfig {
    /// Checks the analytic against the registry and the reference catalog.
    ///
    /// Every problem is collected; any problem makes the whole analytic
    /// unusable.
    #[instrument(skip_all, fields(analytic = %self.analytic_id))]
    pub fn validate_against(
        &self,
        registry: &RuleRegistry,
        catalog: &ReferenceCatalog,
    ) -> Result<(), DomainError> {
        let mut problems: Vec<String> = Vec::new();

        if let Err(errors) = self.validate() {
            problems.extend(errors.to_string().lines().map(|l| l.trim().to_string()));
        }

        for (label, spec) in self.rule_labels().iter().zip(&self.validations) {
            let rule = match registry.get(&spec.rule) {
                Ok(rule) => rule,
                Err(e) => {
                    problems.push(format!("validation '{label}': {e}"));
                    continue;
                }
            };
            for e in rule.check_params(&spec.parameters) {
                problems.push(format!("validation '{label}': {e}"));
            }
            for table in rule.referenced_tables(&spec.parameters) {
                if !catalog.contains(&table) {
                    problems.push(format!(
                        "validation '{label}': reference table '{table}' is not declared"
                    ));
                }
            }
        }

        for name in self.reference_data.keys() {
            if !catalog.contains(name) {
                problems.push(format!("reference_data: table '{name}' is not declared"));
            }
        }

        if problems.is_empty() {
            debug!(rules = self.validations.len(), "Analytic configuration valid");
            Ok(())
        } else {
            Err(DomainError::Configuration {
                analytic: self.analytic_id.clone(),
                problems,
            })
        }
    }

    /// Canonical columns the run needs: rule fields then the grouping key.
    pub fn referenced_fields(&self, registry: &RuleRegistry) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.validations
            .iter()
            .filter_map(|spec| {
                registry
                    .get(&spec.rule)
                    .ok()
                    .map(|rule| rule.referenced_fields(&spec.parameters))
            })
            .flatten()
            .chain(std::iter::once(self.reporting.group_by.clone()))
            .filter(|f| seen.insert(f.clone()))
            .collect()
    }

    /// Tables to bind for a run, with the analytic's freshness override.
    pub fn referenced_tables(&self, registry: &RuleRegistry) -> BTreeMap<String, Option<u32>> {
        let mut tables: BTreeMap<String, Option<u32>> = self
            .reference_data
            .iter()
            .map(|(name, binding)| (name.clone(), binding.max_age_days))
            .collect();
        for spec in &self.validations {
            if let Ok(rule) = registry.get(&spec.rule) {
                for table in rule.referenced_tables(&spec.parameters) {
                    tables.entry(table).or_insert(None);
                }
            }
        }
        tables
    }
}
