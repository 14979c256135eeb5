// conform-core/src/domain/rules/builtin/approval.rs

use crate::domain::reference::Lookup;
use crate::domain::rules::{
    ConformanceRule, RuleContext, RuleError, RuleOutcome, RuleParams, column, param_errors,
};
use crate::domain::schema::value::format_date;
use crate::domain::schema::NormalizedTable;

fn normalized(text: &str) -> String {
    text.trim().to_lowercase()
}

// --- segregation_of_duties ---

/// The submitter must not appear as any approver. Empty cells are ignored.
pub struct SegregationOfDuties;

impl ConformanceRule for SegregationOfDuties {
    fn name(&self) -> &'static str {
        "segregation_of_duties"
    }

    fn description(&self) -> &'static str {
        "Submitter is not also an approver"
    }

    fn check_params(&self, params: &RuleParams) -> Vec<RuleError> {
        param_errors([
            params.require_str("submitter_field").err(),
            params.require_str_list("approver_fields").err(),
        ])
    }

    fn referenced_fields(&self, params: &RuleParams) -> Vec<String> {
        params
            .require_str("submitter_field")
            .map(str::to_string)
            .into_iter()
            .chain(params.require_str_list("approver_fields").unwrap_or_default())
            .collect()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        _ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let submitter_field = params.require_str("submitter_field")?;
        let submitter_col = column(table, submitter_field)?;
        let approvers = params
            .require_str_list("approver_fields")?
            .into_iter()
            .map(|f| column(table, &f).map(|c| (f, c)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..table.len())
            .map(|row| {
                let Some(submitter) = table.value(row, submitter_col).as_text() else {
                    return RuleOutcome::pass();
                };
                let submitter = normalized(&submitter);
                let conflicts: Vec<&str> = approvers
                    .iter()
                    .filter(|(_, col)| {
                        table
                            .value(row, *col)
                            .as_text()
                            .is_some_and(|a| normalized(&a) == submitter)
                    })
                    .map(|(f, _)| f.as_str())
                    .collect();
                if conflicts.is_empty() {
                    RuleOutcome::pass()
                } else {
                    RuleOutcome::fail(format!(
                        "submitter also approved as {}",
                        conflicts.join(", ")
                    ))
                }
            })
            .collect())
    }
}

// --- approval_sequence ---

/// Dates must be non-decreasing across consecutive fields. Pairs with a
/// missing or unreadable date are not compared.
pub struct ApprovalSequence;

impl ApprovalSequence {
    fn fields(params: &RuleParams) -> Result<Vec<String>, RuleError> {
        let fields = params.require_str_list("date_fields_in_order")?;
        if fields.len() < 2 {
            return Err(RuleError::invalid(
                "date_fields_in_order",
                "at least two date fields are required",
            ));
        }
        Ok(fields)
    }
}

impl ConformanceRule for ApprovalSequence {
    fn name(&self) -> &'static str {
        "approval_sequence"
    }

    fn description(&self) -> &'static str {
        "Approval dates follow the declared order"
    }

    fn check_params(&self, params: &RuleParams) -> Vec<RuleError> {
        param_errors([Self::fields(params).err()])
    }

    fn referenced_fields(&self, params: &RuleParams) -> Vec<String> {
        Self::fields(params).unwrap_or_default()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        _ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let cols = Self::fields(params)?
            .into_iter()
            .map(|f| column(table, &f).map(|c| (f, c)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..table.len())
            .map(|row| {
                let violation = cols.windows(2).find_map(|pair| {
                    let (first, a) = &pair[0];
                    let (second, b) = &pair[1];
                    let earlier = table.value(row, *a).as_date()?;
                    let later = table.value(row, *b).as_date()?;
                    (earlier > later).then(|| {
                        format!(
                            "'{first}' ({}) is after '{second}' ({})",
                            format_date(&earlier),
                            format_date(&later)
                        )
                    })
                });
                match violation {
                    Some(reason) => RuleOutcome::fail(reason),
                    None => RuleOutcome::pass(),
                }
            })
            .collect())
    }
}

// --- title_based_approval ---

/// The approver's title, looked up in a dictionary reference table, must be
/// one of `allowed_titles`. Records without an approver conform.
pub struct TitleBasedApproval;

impl ConformanceRule for TitleBasedApproval {
    fn name(&self) -> &'static str {
        "title_based_approval"
    }

    fn description(&self) -> &'static str {
        "Approver holds an allowed title"
    }

    fn check_params(&self, params: &RuleParams) -> Vec<RuleError> {
        param_errors([
            params.require_str("approver_field").err(),
            params.require_str_list("allowed_titles").err(),
            params.require_str("title_reference").err(),
        ])
    }

    fn referenced_fields(&self, params: &RuleParams) -> Vec<String> {
        params
            .require_str("approver_field")
            .map(|f| vec![f.to_string()])
            .unwrap_or_default()
    }

    fn referenced_tables(&self, params: &RuleParams) -> Vec<String> {
        params
            .require_str("title_reference")
            .map(|t| vec![t.to_string()])
            .unwrap_or_default()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let approver_field = params.require_str("approver_field")?;
        let reference_name = params.require_str("title_reference")?;
        let allowed: Vec<String> = params
            .require_str_list("allowed_titles")?
            .iter()
            .map(|t| normalized(t))
            .collect();
        let col = column(table, approver_field)?;
        let reference = ctx.reference(reference_name);

        Ok(table
            .column_values(col)
            .map(|cell| {
                let Some(approver) = cell.as_text() else {
                    return RuleOutcome::pass();
                };
                let reference = match &reference {
                    Ok(bound) => bound,
                    Err(reason) => return RuleOutcome::fail(reason.clone()),
                };
                match reference.lookup(&approver) {
                    Lookup::Value(title) if allowed.contains(&normalized(title)) => {
                        RuleOutcome::pass()
                    }
                    Lookup::Value(title) => {
                        RuleOutcome::fail(format!("approver '{approver}' has title '{title}'"))
                    }
                    Lookup::Null => {
                        RuleOutcome::fail(format!("no title recorded for approver '{approver}'"))
                    }
                    Lookup::NotFound => RuleOutcome::fail(format!(
                        "approver '{approver}' not found in '{reference_name}'"
                    )),
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::analytic::StalePolicy;
    use crate::domain::reference::{
        BindState, BoundReference, ReferenceDecl, ReferenceSet, ReferenceTable,
    };
    use crate::domain::rules::builtin::fixtures::table;
    use crate::domain::schema::DataType;
    use chrono::Utc;
    use std::sync::Arc;

    fn conforms(out: Vec<RuleOutcome>) -> Vec<bool> {
        out.into_iter().map(|o| o.conforms).collect()
    }

    #[test]
    fn test_segregation_of_duties_ignores_case_and_nulls() {
        let t = table(
            &[
                ("submitter", DataType::String),
                ("l1", DataType::String),
                ("l2", DataType::String),
            ],
            &[
                vec!["Alice", "Bob", "Carol"],
                vec!["alice ", "", "ALICE"],
                vec!["", "Bob", "Bob"],
                vec!["Dan", "", ""],
            ],
        );
        let params = RuleParams::new()
            .with("submitter_field", "submitter")
            .with_list("approver_fields", &["l1", "l2"]);
        let refs = ReferenceSet::new();
        let ctx = RuleContext::new(&refs, StalePolicy::Proceed);
        let out = SegregationOfDuties.evaluate(&t, &params, &ctx).unwrap();

        assert_eq!(out[1].reason.as_deref(), Some("submitter also approved as l2"));
        assert_eq!(conforms(out), vec![true, false, true, true]);
    }

    #[test]
    fn test_approval_sequence_only_compares_present_pairs() {
        let t = table(
            &[
                ("submitted", DataType::Date),
                ("reviewed", DataType::Date),
                ("approved", DataType::Date),
            ],
            &[
                vec!["2024-01-01", "2024-01-02", "2024-01-03"],
                vec!["2024-01-05", "2024-01-02", "2024-01-03"],
                vec!["2024-01-05", "", "2024-01-01"],
                vec!["2024-01-01", "2024-01-01", ""],
            ],
        );
        let params =
            RuleParams::new().with_list("date_fields_in_order", &["submitted", "reviewed", "approved"]);
        let refs = ReferenceSet::new();
        let ctx = RuleContext::new(&refs, StalePolicy::Proceed);
        let out = ApprovalSequence.evaluate(&t, &params, &ctx).unwrap();

        assert_eq!(
            out[1].reason.as_deref(),
            Some("'submitted' (2024-01-05) is after 'reviewed' (2024-01-02)")
        );
        assert_eq!(conforms(out), vec![true, false, true, true]);
    }

    #[test]
    fn test_approval_sequence_needs_two_fields() {
        let params = RuleParams::new().with_list("date_fields_in_order", &["only"]);
        assert!(matches!(
            ApprovalSequence.check_params(&params).as_slice(),
            [RuleError::InvalidParameter { .. }]
        ));
    }

    fn titles(state: BindState) -> ReferenceSet {
        let decl = ReferenceDecl::dictionary("Name", "Title");
        let table = ReferenceTable::from_rows(
            "titles",
            &decl,
            vec!["Name".into(), "Title".into()],
            vec![
                vec![Some("Alice".into()), Some("Director".into())],
                vec![Some("Bob".into()), Some("Analyst".into())],
                vec![Some("Eve".into()), None],
            ],
            Utc::now(),
        )
        .unwrap();
        [BoundReference {
            name: "titles".into(),
            version: "1.0".into(),
            state,
            table: Some(Arc::new(table)),
            age_days: Some(120),
            max_age_days: 90,
        }]
        .into_iter()
        .collect()
    }

    fn approvals() -> NormalizedTable {
        table(
            &[("approver", DataType::String)],
            &[vec!["Alice"], vec!["Bob"], vec![""], vec!["Zed"], vec!["Eve"]],
        )
    }

    fn title_params() -> RuleParams {
        RuleParams::new()
            .with("approver_field", "approver")
            .with_list("allowed_titles", &["director", "VP"])
            .with("title_reference", "titles")
    }

    #[test]
    fn test_title_based_approval_outcomes_are_distinct() {
        let refs = titles(BindState::Stale);
        let ctx = RuleContext::new(&refs, StalePolicy::Proceed);
        let out = TitleBasedApproval
            .evaluate(&approvals(), &title_params(), &ctx)
            .unwrap();

        assert!(out[0].conforms, "stale table is still usable");
        assert_eq!(out[1].reason.as_deref(), Some("approver 'Bob' has title 'Analyst'"));
        assert!(out[2].conforms, "no approver");
        assert_eq!(out[3].reason.as_deref(), Some("approver 'Zed' not found in 'titles'"));
        assert_eq!(out[4].reason.as_deref(), Some("no title recorded for approver 'Eve'"));
    }

    #[test]
    fn test_title_based_approval_fail_policy_on_stale_table() {
        let refs = titles(BindState::Stale);
        let ctx = RuleContext::new(&refs, StalePolicy::Fail);
        let out = TitleBasedApproval
            .evaluate(&approvals(), &title_params(), &ctx)
            .unwrap();

        assert!(!out[0].conforms);
        assert!(out[0].reason.as_deref().unwrap().contains("stale"));
        assert!(out[2].conforms);
    }

    #[test]
    fn test_title_based_approval_unbound_table_fails_records() {
        let refs = ReferenceSet::new();
        let ctx = RuleContext::new(&refs, StalePolicy::Proceed);
        let out = TitleBasedApproval
            .evaluate(&approvals(), &title_params(), &ctx)
            .unwrap();
        assert_eq!(conforms(out), vec![false, false, true, false, false]);
        assert_eq!(
            TitleBasedApproval.referenced_tables(&title_params()),
            vec!["titles".to_string()]
        );
    }
}
