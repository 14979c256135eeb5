pub mod analytic;
pub mod classification;
pub mod error;
pub mod reference;
pub mod report;
pub mod rules;
pub mod schema;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use analytic::{AnalyticConfig, RuleSpec, StalePolicy};
pub use classification::{Classification, Conformance};
pub use error::DomainError;
pub use schema::{ColumnMapping, DataType, NormalizedTable, RawTable};
