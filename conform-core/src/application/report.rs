// conform-core/src/application/report.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::domain::analytic::AnalyticConfig;
use crate::domain::reference::ReferenceStatus;
use crate::domain::report::{
    ConfigurationSheet, DetailRecord, GroupKey, ReportSummary, SheetContext,
};
use crate::domain::rules::RuleEvaluation;
use crate::domain::schema::DataType;

// --- DTOs ---

/// Everything one run produced. Identical inputs and `as_of` give an
/// identical report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub analytic_id: String,
    pub analytic_name: String,
    pub as_of: DateTime<Utc>,
    pub source_file: Option<String>,
    pub group_by: String,
    pub threshold: f64,
    pub records: usize,
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<DetailRecord>>,
    pub rule_stats: Vec<RuleStats>,
    pub references: Vec<ReferenceStatus>,
    pub warnings: Vec<RunWarning>,
    pub configuration: ConfigurationSheet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStats {
    pub label: String,
    pub rule: String,
    pub passed: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RuleEvaluation> for RuleStats {
    fn from(e: &RuleEvaluation) -> Self {
        Self {
            label: e.label.clone(),
            rule: e.rule.clone(),
            passed: e.passed(),
            failed: e.failed(),
            error: e.error.as_ref().map(|err| err.to_string()),
        }
    }
}

/// Recoverable problems met during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    CoercionFailures {
        column: String,
        expected: DataType,
        count: usize,
        first_row: usize,
    },
    ShadowedColumn {
        header: String,
    },
    StaleReference {
        table: String,
        age_days: i64,
        max_age_days: u32,
    },
    ReferenceUnavailable {
        table: String,
        reason: String,
    },
    RuleFailed {
        rule: String,
        reason: String,
    },
    ThresholdExceeded {
        group: GroupKey,
        dnc_percentage: f64,
        threshold: f64,
    },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoercionFailures {
                column,
                expected,
                count,
                first_row,
            } => write!(
                f,
                "{count} cell(s) in '{column}' are not a valid {expected} (first at record {first_row})"
            ),
            Self::ShadowedColumn { header } => {
                write!(f, "column '{header}' duplicates an already mapped field and was kept as-is")
            }
            Self::StaleReference {
                table,
                age_days,
                max_age_days,
            } => write!(
                f,
                "reference '{table}' is stale ({age_days} days old, max {max_age_days})"
            ),
            Self::ReferenceUnavailable { table, reason } => {
                write!(f, "reference '{table}' unavailable: {reason}")
            }
            Self::RuleFailed { rule, reason } => write!(f, "rule '{rule}' failed: {reason}"),
            Self::ThresholdExceeded {
                group,
                dnc_percentage,
                threshold,
            } => write!(
                f,
                "{group}: DNC {dnc_percentage:.2}% exceeds threshold {threshold:.2}%"
            ),
        }
    }
}

impl RunReport {
    pub fn warning_lines(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// The report restricted to one group, as written to individual files.
    /// `None` for an unknown group.
    pub fn for_group(&self, config: &AnalyticConfig, key: &GroupKey) -> Option<RunReport> {
        let group = self.summary.group(key)?;
        let warnings = self.warning_lines();
        let configuration = ConfigurationSheet::build(
            config,
            SheetContext {
                as_of: self.as_of,
                source_file: self.source_file.as_deref(),
                warnings: &warnings,
                group: Some((&self.group_by, key.label())),
                counts: &group.counts,
            },
        );

        Some(RunReport {
            records: group.counts.total,
            summary: ReportSummary {
                groups: vec![group.clone()],
                overall: group.counts,
                summary_fields: self.summary.summary_fields.clone(),
            },
            detail: self
                .detail
                .as_ref()
                .map(|d| d.iter().filter(|r| &r.group == key).cloned().collect()),
            configuration,
            ..self.clone()
        })
    }
}
