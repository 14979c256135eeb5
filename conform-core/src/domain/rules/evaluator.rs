// conform-core/src/domain/rules/evaluator.rs

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

use super::error::RuleError;
use super::params::RuleParams;
use super::{ConformanceRule, RuleContext, RuleOutcome};
use crate::domain::schema::NormalizedTable;

/// Per-record outcomes of one configured rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    /// Label used in failing-rule lists; unique within an analytic.
    pub label: String,
    pub rule: String,
    pub outcomes: Vec<RuleOutcome>,
    pub error: Option<RuleError>,
}

impl RuleEvaluation {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.conforms).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }
}

/// Runs one rule over the batch.
///
/// Parameter problems, missing columns, panics and a wrong outcome count all
/// fail the rule as a whole: every record gets a non-conforming outcome whose
/// reason carries the error.
pub fn evaluate_rule(
    label: &str,
    rule: &dyn ConformanceRule,
    params: &RuleParams,
    table: &NormalizedTable,
    ctx: &RuleContext<'_>,
) -> RuleEvaluation {
    let result = match rule.check_params(params).into_iter().next() {
        Some(problem) => Err(problem),
        None => catch_unwind(AssertUnwindSafe(|| rule.evaluate(table, params, ctx)))
            .unwrap_or_else(|payload| Err(RuleError::Panicked(panic_message(payload.as_ref())))),
    }
    .and_then(|outcomes| {
        if outcomes.len() == table.len() {
            Ok(outcomes)
        } else {
            Err(RuleError::OutcomeCountMismatch {
                expected: table.len(),
                actual: outcomes.len(),
            })
        }
    });

    match result {
        Ok(outcomes) => {
            let evaluation = RuleEvaluation {
                label: label.to_string(),
                rule: rule.name().to_string(),
                outcomes,
                error: None,
            };
            debug!(
                rule = label,
                passed = evaluation.passed(),
                failed = evaluation.failed(),
                "Rule evaluated"
            );
            evaluation
        }
        Err(e) => {
            warn!(rule = label, error = %e, "Rule failed, all records marked non-conforming");
            let reason = format!("rule error: {e}");
            RuleEvaluation {
                label: label.to_string(),
                rule: rule.name().to_string(),
                outcomes: vec![RuleOutcome::fail(reason); table.len()],
                error: Some(e),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
