// conform-core/src/domain/rules/error.rs

use miette::Diagnostic;
use thiserror::Error;

/// Failure of one rule as a whole. Every record then counts as non-conforming for it.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum RuleError {
    #[error("Unknown rule '{0}'")]
    #[diagnostic(
        code(conform::rule::unknown),
        help("Use `conform list --rules` to see the registered rules.")
    )]
    Unknown(String),

    #[error("Missing required parameter '{0}'")]
    #[diagnostic(code(conform::rule::missing_parameter))]
    MissingParameter(String),

    #[error("Invalid parameter '{name}': {reason}")]
    #[diagnostic(code(conform::rule::invalid_parameter))]
    InvalidParameter { name: String, reason: String },

    #[error("Column '{0}' is not present in the normalized input")]
    #[diagnostic(code(conform::rule::missing_column))]
    MissingColumn(String),

    #[error("Rule returned {actual} outcomes for {expected} records")]
    #[diagnostic(code(conform::rule::outcome_count))]
    OutcomeCountMismatch { expected: usize, actual: usize },

    #[error("Rule panicked: {0}")]
    #[diagnostic(code(conform::rule::panicked))]
    Panicked(String),

    #[error("Rule failed: {0}")]
    #[diagnostic(code(conform::rule::failed))]
    Failed(String),
}

impl RuleError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
