// conform-core/src/domain/reference/error.rs

use miette::Diagnostic;
use thiserror::Error;

/// Why a reference table could not be produced. Never fatal to a run.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("No file path declared for reference table '{0}'")]
    #[diagnostic(code(conform::reference::no_path))]
    NoPath(String),

    #[error("Cannot read reference file '{path}': {reason}")]
    #[diagnostic(
        code(conform::reference::io),
        help("Check that the file exists and is readable.")
    )]
    Io { path: String, reason: String },

    #[error("Cannot parse reference file '{path}': {reason}")]
    #[diagnostic(code(conform::reference::parse))]
    Parse { path: String, reason: String },

    #[error("Unsupported reference file type for '{path}' (expected .csv)")]
    #[diagnostic(code(conform::reference::unsupported))]
    Unsupported { path: String },

    #[error("Reference table '{table}' has no column '{column}'")]
    #[diagnostic(
        code(conform::reference::missing_column),
        help("key_column and value_column must match the file header.")
    )]
    MissingColumn { table: String, column: String },

    #[error("Dictionary reference table '{0}' declares no value_column")]
    #[diagnostic(code(conform::reference::missing_value_column))]
    MissingValueColumn(String),

    #[error("Loading reference table '{table}' timed out after {millis} ms")]
    #[diagnostic(code(conform::reference::timeout))]
    Timeout { table: String, millis: u128 },
}
