// conform-core/src/domain/report/aggregate.rs

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::summary::{Counts, GroupKey, GroupSummary, ReportSummary, SummaryField};
use crate::domain::classification::{Classification, Conformance};
use crate::domain::schema::{CellValue, NormalizedTable};

/// One classified record as it appears in the detail report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    pub record_index: usize,
    pub group: GroupKey,
    pub status: Conformance,
    pub failing_rules: Vec<String>,
    pub notes: Vec<String>,
    #[serde(rename = "DNC_Validated")]
    pub dnc_validated: String,
    pub values: IndexMap<String, CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub summary: ReportSummary,
    pub detail: Vec<DetailRecord>,
}

/// Groups classified records by the exact value of `group_by`.
///
/// Groups appear in first-seen order and records keep their original order
/// within a group. A missing grouping column puts every record in the
/// ungrouped bucket; callers check the column beforehand.
pub fn aggregate(
    table: &NormalizedTable,
    classifications: &[Classification],
    group_by: &str,
    summary_fields: &[SummaryField],
    threshold: f64,
) -> Aggregation {
    let group_col = table.column_index(group_by);

    let mut buckets: IndexMap<GroupKey, (Counts, Vec<&Classification>)> = IndexMap::new();
    let mut overall = Counts::default();
    for c in classifications {
        let key = group_col
            .and_then(|col| table.value(c.record_index, col).as_text())
            .map(|v| GroupKey::Value(v.into_owned()))
            .unwrap_or(GroupKey::Ungrouped);
        let (counts, members) = buckets.entry(key).or_default();
        counts.add(c.status);
        members.push(c);
        overall.add(c.status);
    }
    overall.finish(threshold);

    let mut groups = Vec::with_capacity(buckets.len());
    let mut detail = Vec::with_capacity(classifications.len());
    for (key, (mut counts, members)) in buckets {
        counts.finish(threshold);
        detail.extend(members.into_iter().map(|c| DetailRecord {
            record_index: c.record_index,
            group: key.clone(),
            status: c.status,
            failing_rules: c.failing_rules.clone(),
            notes: c.notes.clone(),
            dnc_validated: c.status.validation_marker().to_string(),
            values: record_values(table, c.record_index),
        }));
        groups.push(GroupSummary { group: key, counts });
    }

    debug!(
        groups = groups.len(),
        records = detail.len(),
        dnc_percentage = overall.dnc_percentage,
        "Aggregation complete"
    );

    Aggregation {
        summary: ReportSummary {
            groups,
            overall,
            summary_fields: summary_fields.to_vec(),
        },
        detail,
    }
}

fn record_values(table: &NormalizedTable, row: usize) -> IndexMap<String, CellValue> {
    let mut values = IndexMap::with_capacity(table.columns().len());
    for (col, info) in table.columns().iter().enumerate() {
        values
            .entry(info.name.clone())
            .or_insert_with(|| table.value(row, col).clone());
    }
    values
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::classification::classify_batch;
    use crate::domain::rules::{RuleEvaluation, RuleOutcome};
    use crate::domain::schema::{ColumnMapping, DataType, RawTable, SchemaResolver};

    fn table(groups: &[&str]) -> NormalizedTable {
        let rows: Vec<Vec<&str>> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| vec![["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9"][i], *g])
            .collect();
        let raw = RawTable::from_strs(&["id", "team"], &rows);
        let mappings = [
            ColumnMapping::identity("id", DataType::String),
            ColumnMapping::identity("team", DataType::String),
        ];
        SchemaResolver::new(&mappings).resolve(&raw, &[]).unwrap().table
    }

    fn single_rule(pattern: &[bool]) -> Vec<Classification> {
        let eval = RuleEvaluation {
            label: "status_check".into(),
            rule: "field_equals".into(),
            outcomes: pattern
                .iter()
                .map(|ok| if *ok { RuleOutcome::pass() } else { RuleOutcome::fail("x") })
                .collect(),
            error: None,
        };
        classify_batch(pattern.len(), &[eval])
    }

    #[test]
    fn test_seven_of_ten_pass() {
        let t = table(&["A"; 10]);
        let pattern = [true, true, false, true, true, false, true, false, true, true];
        let agg = aggregate(&t, &single_rule(&pattern), "team", &SummaryField::all(), 5.0);

        let overall = agg.summary.overall;
        assert_eq!((overall.gc, overall.pc, overall.dnc, overall.total), (7, 0, 3, 10));
        assert_eq!(overall.dnc_percentage, 30.0);
        assert!(overall.exceeds_threshold);
        assert_eq!(overall.gc + overall.pc + overall.dnc, overall.total);
    }

    #[test]
    fn test_null_group_values_form_ungrouped_bucket() {
        let t = table(&["B", "A", "", "B", "A", "A", "", "B", "A", "B"]);
        let agg = aggregate(&t, &single_rule(&[true; 10]), "team", &SummaryField::all(), 5.0);

        let labels: Vec<_> = agg.summary.groups.iter().map(|g| g.group.label()).collect();
        assert_eq!(labels, vec!["B", "A", "Ungrouped"]);
        let ungrouped = agg.summary.group(&GroupKey::Ungrouped).unwrap();
        assert_eq!(ungrouped.counts.total, 2);

        let order: Vec<usize> = agg.detail.iter().map(|d| d.record_index).collect();
        assert_eq!(order, vec![0, 3, 7, 9, 1, 4, 5, 8, 2, 6]);
    }

    #[test]
    fn test_grouping_is_case_sensitive() {
        let t = table(&["a", "A"]);
        let agg = aggregate(&t, &single_rule(&[true, false]), "team", &SummaryField::all(), 5.0);
        assert_eq!(agg.summary.groups.len(), 2);
        assert_eq!(agg.detail[1].dnc_validated, "TBD");
        assert_eq!(agg.detail[0].dnc_validated, "N/A");
        assert_eq!(
            agg.detail[0].values.get("id"),
            Some(&CellValue::Text("r0".into()))
        );
    }

    #[test]
    fn test_empty_batch() {
        let t = table(&[]);
        let agg = aggregate(&t, &[], "team", &SummaryField::all(), 5.0);
        assert!(agg.summary.groups.is_empty());
        assert_eq!(agg.summary.overall.total, 0);
        assert_eq!(agg.summary.overall.dnc_percentage, 0.0);
        assert!(!agg.summary.overall.exceeds_threshold);
    }

    #[test]
    fn test_rows_follow_summary_fields() {
        let t = table(&["A", "A"]);
        let agg = aggregate(
            &t,
            &single_rule(&[true, false]),
            "team",
            &[SummaryField::Total, SummaryField::DncPercentage],
            5.0,
        );
        assert_eq!(agg.summary.header("team"), vec!["team", "Total", "DNC_Percentage"]);
        assert_eq!(
            agg.summary.rows(),
            vec![
                vec!["A".to_string(), "2".into(), "50.00".into()],
                vec!["Overall".to_string(), "2".into(), "50.00".into()],
            ]
        );
    }
}
