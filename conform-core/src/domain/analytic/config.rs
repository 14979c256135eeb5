// conform-core/src/domain/analytic/config.rs

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::domain::report::SummaryField;
use crate::domain::rules::RuleParams;
use crate::domain::schema::ColumnMapping;

/// What rules do with a stale reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Use the table; the staleness is reported.
    #[default]
    Proceed,
    /// Every lookup against the table fails its record.
    Fail,
}

/// One validation unit: rule set, grouping and threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AnalyticConfig {
    #[serde(deserialize_with = "id_as_string")]
    #[validate(length(min = 1, message = "analytic_id must not be empty"))]
    pub analytic_id: String,

    #[validate(length(min = 1, message = "analytic_name must not be empty"))]
    pub analytic_name: String,

    #[serde(default)]
    pub analytic_description: String,

    #[serde(default)]
    pub data_source: DataSourceRef,

    /// Reference table name -> freshness override.
    #[serde(default)]
    pub reference_data: BTreeMap<String, ReferenceBinding>,

    #[serde(default)]
    pub stale_reference_policy: StalePolicy,

    #[validate(nested)]
    #[serde(default)]
    pub validations: Vec<RuleSpec>,

    #[validate(nested)]
    pub thresholds: Threshold,

    #[validate(nested)]
    pub reporting: Reporting,

    #[serde(default)]
    pub report_metadata: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSourceRef {
    /// Data source in data_sources.yaml supplying the column mappings.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Inline mappings; they take precedence over the data source's.
    #[serde(default)]
    pub columns: Vec<ColumnMapping>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceBinding {
    #[serde(default)]
    pub max_age_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RuleSpec {
    #[validate(length(min = 1, message = "rule name must not be empty"))]
    pub rule: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub parameters: RuleParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Threshold {
    /// Maximum acceptable DNC percentage.
    #[validate(range(min = 0.0, max = 100.0, message = "error_percentage must be within 0..=100"))]
    pub error_percentage: f64,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Reporting {
    #[validate(length(min = 1, message = "group_by must not be empty"))]
    pub group_by: String,
    #[serde(default = "SummaryField::all")]
    pub summary_fields: Vec<SummaryField>,
    #[serde(default = "default_true")]
    pub detail_required: bool,
}

fn default_true() -> bool {
    true
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Int(i64),
        Text(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Int(i) => i.to_string(),
        IdRepr::Text(s) => s.trim().to_string(),
    })
}

impl RuleSpec {
    pub fn new(rule: impl Into<String>, parameters: RuleParams) -> Self {
        Self {
            rule: rule.into(),
            description: String::new(),
            rationale: String::new(),
            parameters,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl AnalyticConfig {
    /// Minimal analytic, mostly for tests and programmatic callers.
    pub fn new(id: impl Into<String>, name: impl Into<String>, group_by: impl Into<String>) -> Self {
        Self {
            analytic_id: id.into(),
            analytic_name: name.into(),
            analytic_description: String::new(),
            data_source: DataSourceRef::default(),
            reference_data: BTreeMap::new(),
            stale_reference_policy: StalePolicy::default(),
            validations: Vec::new(),
            thresholds: Threshold {
                error_percentage: 5.0,
                rationale: String::new(),
            },
            reporting: Reporting {
                group_by: group_by.into(),
                summary_fields: SummaryField::all(),
                detail_required: true,
            },
            report_metadata: IndexMap::new(),
        }
    }

    pub fn with_rule(mut self, spec: RuleSpec) -> Self {
        self.validations.push(spec);
        self
    }

    pub fn with_required(mut self, fields: &[&str]) -> Self {
        self.data_source.required_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_threshold(mut self, error_percentage: f64) -> Self {
        self.thresholds.error_percentage = error_percentage;
        self
    }

    pub fn with_reference(mut self, name: &str, max_age_days: Option<u32>) -> Self {
        self.reference_data
            .insert(name.to_string(), ReferenceBinding { max_age_days });
        self
    }

    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_reference_policy = policy;
        self
    }

    pub fn display_name(&self) -> String {
        format!("QA-{} {}", self.analytic_id, self.analytic_name)
    }

    /// Unique label per configured rule: a repeated rule name gets `#2`, `#3`...
    pub fn rule_labels(&self) -> Vec<String> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        self.validations
            .iter()
            .map(|spec| {
                let n = seen.entry(spec.rule.as_str()).or_default();
                *n += 1;
                if *n == 1 {
                    spec.rule.clone()
                } else {
                    format!("{}#{}", spec.rule, n)
                }
            })
            .collect()
    }
}
