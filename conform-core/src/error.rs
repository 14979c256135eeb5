// conform-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ConformError {
    // --- DOMAIN (configuration, schema, invariants) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (IO, parsing) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl ConformError {
    /// True for errors raised before any record was processed.
    pub fn is_pre_run(&self) -> bool {
        matches!(
            self,
            ConformError::Domain(
                DomainError::Configuration { .. }
                    | DomainError::Schema { .. }
                    | DomainError::UnresolvedFields { .. }
            )
        )
    }
}

impl From<std::io::Error> for ConformError {
    fn from(err: std::io::Error) -> Self {
        ConformError::Infrastructure(InfrastructureError::Io(err))
    }
}
