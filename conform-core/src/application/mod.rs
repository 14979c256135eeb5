// conform-core/src/application/mod.rs

pub mod batch;
pub mod engine;
pub mod output;
pub mod report;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use conform_core::application::{run_analytic, RunContext, write_report};`

pub use batch::{BatchJob, BatchOutcome, run_batch};
pub use engine::{RunContext, RunInput, run_analytic};
pub use output::{write_group_reports, write_report};
pub use report::{RuleStats, RunReport, RunWarning};
