// conform-core/src/domain/report/summary.rs

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::domain::classification::Conformance;

/// Columns of the summary table, in the spelling reports use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryField {
    #[serde(rename = "GC")]
    Gc,
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "DNC")]
    Dnc,
    Total,
    #[serde(rename = "DNC_Percentage")]
    DncPercentage,
    #[serde(rename = "Exceeds_Threshold")]
    ExceedsThreshold,
}

impl SummaryField {
    pub fn all() -> Vec<Self> {
        vec![
            Self::Gc,
            Self::Pc,
            Self::Dnc,
            Self::Total,
            Self::DncPercentage,
            Self::ExceedsThreshold,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gc => "GC",
            Self::Pc => "PC",
            Self::Dnc => "DNC",
            Self::Total => "Total",
            Self::DncPercentage => "DNC_Percentage",
            Self::ExceedsThreshold => "Exceeds_Threshold",
        }
    }
}

impl fmt::Display for SummaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group value of a record. Missing values share one explicit bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Value(String),
    Ungrouped,
}

impl GroupKey {
    pub fn label(&self) -> &str {
        match self {
            Self::Value(v) => v,
            Self::Ungrouped => "Ungrouped",
        }
    }

    pub fn is_ungrouped(&self) -> bool {
        matches!(self, Self::Ungrouped)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_str(v),
            Self::Ungrouped => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Counts {
    #[serde(rename = "GC")]
    pub gc: usize,
    #[serde(rename = "PC")]
    pub pc: usize,
    #[serde(rename = "DNC")]
    pub dnc: usize,
    #[serde(rename = "Total")]
    pub total: usize,
    #[serde(rename = "DNC_Percentage")]
    pub dnc_percentage: f64,
    #[serde(rename = "Exceeds_Threshold")]
    pub exceeds_threshold: bool,
}

impl Counts {
    pub fn add(&mut self, status: Conformance) {
        match status {
            Conformance::GenerallyConforming => self.gc += 1,
            Conformance::PartiallyConforming => self.pc += 1,
            Conformance::DoesNotConform => self.dnc += 1,
        }
        self.total += 1;
    }

    /// Computes the DNC percentage (two decimals) and the threshold flag.
    /// Exceeding means strictly above `threshold`.
    pub fn finish(&mut self, threshold: f64) {
        self.dnc_percentage = percentage(self.dnc, self.total);
        self.exceeds_threshold = self.dnc_percentage > threshold;
    }

    pub fn gc_percentage(&self) -> f64 {
        percentage(self.gc, self.total)
    }

    pub fn pc_percentage(&self) -> f64 {
        percentage(self.pc, self.total)
    }

    pub fn field(&self, field: SummaryField) -> String {
        match field {
            SummaryField::Gc => self.gc.to_string(),
            SummaryField::Pc => self.pc.to_string(),
            SummaryField::Dnc => self.dnc.to_string(),
            SummaryField::Total => self.total.to_string(),
            SummaryField::DncPercentage => format!("{:.2}", self.dnc_percentage),
            SummaryField::ExceedsThreshold => {
                let flag = if self.exceeds_threshold { "Yes" } else { "No" };
                flag.to_string()
            }
        }
    }
}

pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = 100.0 * part as f64 / total as f64;
    (raw * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: GroupKey,
    #[serde(flatten)]
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub groups: Vec<GroupSummary>,
    pub overall: Counts,
    pub summary_fields: Vec<SummaryField>,
}

impl ReportSummary {
    pub fn group(&self, key: &GroupKey) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| &g.group == key)
    }

    pub fn header(&self, group_label: &str) -> Vec<String> {
        std::iter::once(group_label.to_string())
            .chain(self.summary_fields.iter().map(|f| f.to_string()))
            .collect()
    }

    /// One row per group then an `Overall` row, restricted to `summary_fields`.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let render = |label: &str, counts: &Counts| {
            std::iter::once(label.to_string())
                .chain(self.summary_fields.iter().map(|f| counts.field(*f)))
                .collect::<Vec<_>>()
        };
        self.groups
            .iter()
            .map(|g| render(g.group.label(), &g.counts))
            .chain(std::iter::once(render("Overall", &self.overall)))
            .collect()
    }

    pub fn any_exceeds_threshold(&self) -> bool {
        self.overall.exceeds_threshold || self.groups.iter().any(|g| g.counts.exceeds_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounding_and_zero_total() {
        assert_eq!(percentage(3, 10), 30.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut counts = Counts::default();
        for s in [Conformance::DoesNotConform, Conformance::GenerallyConforming] {
            counts.add(s);
        }
        counts.finish(50.0);
        assert_eq!(counts.dnc_percentage, 50.0);
        assert!(!counts.exceeds_threshold);
        counts.finish(49.99);
        assert!(counts.exceeds_threshold);
    }

    #[test]
    fn test_summary_json_shape() -> anyhow::Result<()> {
        let mut counts = Counts::default();
        counts.add(Conformance::DoesNotConform);
        counts.finish(5.0);
        let group = GroupSummary {
            group: GroupKey::Ungrouped,
            counts,
        };
        let json = serde_json::to_value(&group)?;
        assert_eq!(json["group"], serde_json::Value::Null);
        assert_eq!(json["DNC"], 1);
        assert_eq!(json["DNC_Percentage"], 100.0);
        assert_eq!(json["Exceeds_Threshold"], true);
        Ok(())
    }

    #[test]
    fn test_summary_field_names() -> anyhow::Result<()> {
        let fields: Vec<SummaryField> =
            serde_yaml::from_str("[GC, PC, DNC, Total, DNC_Percentage, Exceeds_Threshold]")?;
        assert_eq!(fields, SummaryField::all());
        assert!(serde_yaml::from_str::<Vec<SummaryField>>("[Bogus]").is_err());
        Ok(())
    }
}
