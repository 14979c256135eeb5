// conform-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DomainError {
    #[error("Configuration error in analytic '{analytic}': {}", .problems.join("; "))]
    #[diagnostic(
        code(conform::domain::configuration),
        help("Fix every listed problem in the analytic definition; no record was processed.")
    )]
    Configuration {
        analytic: String,
        problems: Vec<String>,
    },

    #[error("Schema Error: missing required field(s): {}", .missing.join(", "))]
    #[diagnostic(
        code(conform::domain::schema),
        help("Add the columns to the input or declare an alias for them in the column mappings.")
    )]
    Schema { missing: Vec<String> },

    #[error("Analytic '{analytic}' references field(s) absent after normalization: {}", .fields.join(", "))]
    #[diagnostic(
        code(conform::domain::unresolved_fields),
        help("Rule parameters and the grouping key must name canonical columns.")
    )]
    UnresolvedFields {
        analytic: String,
        fields: Vec<String>,
    },

    #[error("Reference table '{name}' is not declared")]
    #[diagnostic(
        code(conform::domain::reference_not_declared),
        help("Declare the table under `reference_files` in reference_data.yaml.")
    )]
    ReferenceNotDeclared { name: String },
}
