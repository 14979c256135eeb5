// conform-core/src/domain/report/mod.rs

pub mod aggregate;
pub mod metadata;
pub mod summary;

pub use aggregate::{Aggregation, DetailRecord, aggregate};
pub use metadata::{ConfigurationSheet, SheetContext, SheetRow};
pub use summary::{Counts, GroupKey, GroupSummary, ReportSummary, SummaryField};
