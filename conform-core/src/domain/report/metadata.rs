// conform-core/src/domain/report/metadata.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::summary::Counts;
use crate::domain::analytic::AnalyticConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    pub parameter: String,
    pub value: String,
}

/// Parameter/value listing describing how a report was produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ConfigurationSheet {
    pub rows: Vec<SheetRow>,
}

/// Inputs of the sheet that come from the run rather than the analytic.
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    pub as_of: DateTime<Utc>,
    pub source_file: Option<&'a str>,
    pub warnings: &'a [String],
    /// `(group_by field, group label)` for per-group reports.
    pub group: Option<(&'a str, &'a str)>,
    pub counts: &'a Counts,
}

impl ConfigurationSheet {
    fn push(&mut self, parameter: impl Into<String>, value: impl Into<String>) {
        self.rows.push(SheetRow {
            parameter: parameter.into(),
            value: value.into(),
        });
    }

    fn section(&mut self, title: &str) {
        self.push(format!("--- {title} ---"), "");
    }

    pub fn build(config: &AnalyticConfig, ctx: SheetContext<'_>) -> Self {
        let mut sheet = Self::default();

        sheet.push("Analytic ID", config.analytic_id.as_str());
        sheet.push("Analytic Name", config.analytic_name.as_str());
        if !config.analytic_description.is_empty() {
            sheet.push("Description", config.analytic_description.as_str());
        }
        sheet.push("Run Date", ctx.as_of.format("%Y-%m-%d %H:%M:%S").to_string());
        if let Some(source) = ctx.source_file {
            sheet.push("Source File", source);
        }
        sheet.push(
            "Error Threshold (%)",
            format!("{:.2}", config.thresholds.error_percentage),
        );
        if !config.thresholds.rationale.is_empty() {
            sheet.push("Threshold Rationale", config.thresholds.rationale.as_str());
        }

        if let Some(name) = &config.data_source.name {
            sheet.section("DATA SOURCE");
            sheet.push("Data Source", name.as_str());
        }

        if !ctx.warnings.is_empty() {
            sheet.section("WARNINGS");
            for (i, warning) in ctx.warnings.iter().enumerate() {
                sheet.push(format!("Warning {}", i + 1), warning.as_str());
            }
        }

        sheet.section("VALIDATION RULES");
        for (i, spec) in config.validations.iter().enumerate() {
            let description = if spec.description.is_empty() {
                "No description"
            } else {
                spec.description.as_str()
            };
            sheet.push(format!("Rule {}", i + 1), format!("{}: {}", spec.rule, description));
            if !spec.rationale.is_empty() {
                sheet.push(format!("Rule {} Rationale", i + 1), spec.rationale.as_str());
            }
        }

        if !config.report_metadata.is_empty() {
            sheet.section("REPORT METADATA");
            for (key, value) in &config.report_metadata {
                sheet.push(title_case(key), yaml_scalar(value));
            }
        }

        if let Some((field, label)) = ctx.group {
            sheet.push(field, label);
        }

        sheet.section("RESULTS SUMMARY");
        let c = ctx.counts;
        sheet.push("Total Records", c.total.to_string());
        sheet.push(
            "Generally Conforms (GC)",
            format!("{} ({:.1}%)", c.gc, c.gc_percentage()),
        );
        sheet.push(
            "Does Not Conform (DNC)",
            format!("{} ({:.1}%)", c.dnc, c.dnc_percentage),
        );
        sheet.push(
            "Partially Conforms (PC)",
            format!("{} ({:.1}%)", c.pc, c.pc_percentage()),
        );

        sheet
    }

    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.parameter == parameter)
            .map(|r| r.value.as_str())
    }
}

/// `review_frequency` -> `Review Frequency`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn yaml_scalar(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
