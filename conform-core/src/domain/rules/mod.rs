// conform-core/src/domain/rules/mod.rs

pub mod builtin;
pub mod error;
pub mod evaluator;
pub mod params;
pub mod registry;

pub use error::RuleError;
pub use evaluator::{RuleEvaluation, evaluate_rule};
pub use params::RuleParams;
pub use registry::RuleRegistry;

use crate::domain::analytic::StalePolicy;
use crate::domain::reference::{BindState, BoundReference, ReferenceSet};
use crate::domain::schema::NormalizedTable;

/// One rule's verdict on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub conforms: bool,
    pub reason: Option<String>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self {
            conforms: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            conforms: false,
            reason: Some(reason.into()),
        }
    }
}

/// Read-only run state visible to rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub references: &'a ReferenceSet,
    pub stale_policy: StalePolicy,
}

impl<'a> RuleContext<'a> {
    pub fn new(references: &'a ReferenceSet, stale_policy: StalePolicy) -> Self {
        Self {
            references,
            stale_policy,
        }
    }

    /// The bound table, or the reason every lookup against it must fail.
    pub fn reference(&self, name: &str) -> Result<&'a BoundReference, String> {
        let bound = self
            .references
            .get(name)
            .ok_or_else(|| format!("reference table '{name}' is not bound for this analytic"))?;
        match (&bound.state, self.stale_policy) {
            (BindState::Stale, StalePolicy::Fail) => Err(format!(
                "reference table '{name}' is stale ({} days old, max {})",
                bound.age_days.unwrap_or_default(),
                bound.max_age_days
            )),
            (BindState::Unavailable { reason }, _) => {
                Err(format!("reference table '{name}' is unavailable: {reason}"))
            }
            _ => Ok(bound),
        }
    }
}

/// A named, parameterized check over a whole batch.
///
/// `evaluate` returns exactly one outcome per record, in record order, and
/// must not carry state from one record to the next.
pub trait ConformanceRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Every parameter problem, empty when the parameters are usable.
    fn check_params(&self, params: &RuleParams) -> Vec<RuleError>;

    /// Canonical columns the rule reads.
    fn referenced_fields(&self, params: &RuleParams) -> Vec<String>;

    /// Reference tables the rule reads.
    fn referenced_tables(&self, _params: &RuleParams) -> Vec<String> {
        Vec::new()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError>;
}

/// Column index of `field`, or `MissingColumn`.
pub(crate) fn column(table: &NormalizedTable, field: &str) -> Result<usize, RuleError> {
    table
        .column_index(field)
        .ok_or_else(|| RuleError::MissingColumn(field.to_string()))
}

/// Keeps the failed checks, in declaration order.
pub(crate) fn param_errors<I>(checks: I) -> Vec<RuleError>
where
    I: IntoIterator<Item = Option<RuleError>>,
{
    checks.into_iter().flatten().collect()
}
