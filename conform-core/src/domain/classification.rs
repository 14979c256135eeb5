// conform-core/src/domain/classification.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::rules::{RuleEvaluation, RuleOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conformance {
    #[serde(rename = "GC")]
    GenerallyConforming,
    #[serde(rename = "PC")]
    PartiallyConforming,
    #[serde(rename = "DNC")]
    DoesNotConform,
}

impl Conformance {
    pub fn code(&self) -> &'static str {
        match self {
            Self::GenerallyConforming => "GC",
            Self::PartiallyConforming => "PC",
            Self::DoesNotConform => "DNC",
        }
    }

    /// Review marker on detail rows: DNC records await manual validation.
    pub fn validation_marker(&self) -> &'static str {
        match self {
            Self::DoesNotConform => "TBD",
            _ => "N/A",
        }
    }
}

impl fmt::Display for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub record_index: usize,
    pub status: Conformance,
    /// Labels of the rules the record failed, in configuration order.
    pub failing_rules: Vec<String>,
    /// `label: reason` for each failure that carried a reason.
    pub notes: Vec<String>,
}

/// All pass -> GC, none pass -> DNC, otherwise PC. No rules -> GC.
pub fn classify<'a, I>(record_index: usize, outcomes: I) -> Classification
where
    I: IntoIterator<Item = (&'a str, &'a RuleOutcome)>,
{
    let mut evaluated = 0usize;
    let mut failing_rules = Vec::new();
    let mut notes = Vec::new();

    for (label, outcome) in outcomes {
        evaluated += 1;
        if !outcome.conforms {
            failing_rules.push(label.to_string());
            if let Some(reason) = &outcome.reason {
                notes.push(format!("{label}: {reason}"));
            }
        }
    }

    let status = if failing_rules.is_empty() {
        Conformance::GenerallyConforming
    } else if failing_rules.len() == evaluated {
        Conformance::DoesNotConform
    } else {
        Conformance::PartiallyConforming
    };

    Classification {
        record_index,
        status,
        failing_rules,
        notes,
    }
}

/// Classifies every record of a batch from the per-rule evaluations.
pub fn classify_batch(records: usize, evaluations: &[RuleEvaluation]) -> Vec<Classification> {
    (0..records)
        .map(|i| {
            classify(
                i,
                evaluations
                    .iter()
                    .filter_map(|e| e.outcomes.get(i).map(|o| (e.label.as_str(), o))),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(label: &str, pattern: &[bool]) -> RuleEvaluation {
        RuleEvaluation {
            label: label.into(),
            rule: label.into(),
            outcomes: pattern
                .iter()
                .map(|ok| {
                    if *ok {
                        RuleOutcome::pass()
                    } else {
                        RuleOutcome::fail("nope")
                    }
                })
                .collect(),
            error: None,
        }
    }

    #[test]
    fn test_classification_policy() {
        let evals = [eval("r1", &[true, false, false, true]), eval("r2", &[true, true, false, false])];
        let statuses: Vec<_> = classify_batch(4, &evals).into_iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                Conformance::GenerallyConforming,
                Conformance::PartiallyConforming,
                Conformance::DoesNotConform,
                Conformance::PartiallyConforming,
            ]
        );
    }

    #[test]
    fn test_failing_rule_one_only_is_pc() {
        let evals = [eval("rule_1", &[false]), eval("rule_2", &[true])];
        let c = &classify_batch(1, &evals)[0];
        assert_eq!(c.status, Conformance::PartiallyConforming);
        assert_eq!(c.failing_rules, vec!["rule_1"]);
        assert_eq!(c.notes, vec!["rule_1: nope"]);
    }

    #[test]
    fn test_zero_rules_is_gc() {
        let c = classify(0, std::iter::empty());
        assert_eq!(c.status, Conformance::GenerallyConforming);
        assert!(c.failing_rules.is_empty());
        assert_eq!(classify_batch(3, &[]).len(), 3);
    }

    #[test]
    fn test_single_rule_is_gc_or_dnc() {
        let evals = [eval("only", &[true, false])];
        let c = classify_batch(2, &evals);
        assert_eq!(c[0].status, Conformance::GenerallyConforming);
        assert_eq!(c[1].status, Conformance::DoesNotConform);
        assert_eq!(c[1].status.validation_marker(), "TBD");
        assert_eq!(c[0].status.validation_marker(), "N/A");
    }

    #[test]
    fn test_codes_serialize_short() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Conformance::DoesNotConform)?, "\"DNC\"");
        assert_eq!(Conformance::PartiallyConforming.to_string(), "PC");
        Ok(())
    }
}
