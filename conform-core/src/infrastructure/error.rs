// conform-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(conform::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("Cannot read '{path}': {source}")]
    #[diagnostic(code(conform::infra::read))]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error in '{path}': {source}")]
    #[diagnostic(
        code(conform::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(conform::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(conform::infra::config_missing))]
    ConfigNotFound(String),

    #[error("No analytic with id '{0}'")]
    #[diagnostic(
        code(conform::infra::analytic_missing),
        help("Run `conform list` to see the configured analytics.")
    )]
    AnalyticNotFound(String),

    // --- DATA FILES ---
    #[error("CSV Error in '{path}': {source}")]
    #[diagnostic(
        code(conform::infra::csv),
        help("The input must be a comma-separated file with a header row.")
    )]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("JSON Serialization Error: {0}")]
    #[diagnostic(code(conform::infra::json))]
    JsonError(#[from] serde_json::Error),
}

impl InfrastructureError {
    pub(crate) fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.display().to_string(),
            source,
        }
    }
}
