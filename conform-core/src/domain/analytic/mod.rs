// conform-core/src/domain/analytic/mod.rs

pub mod config;
pub mod validate;

pub use config::{
    AnalyticConfig, DataSourceRef, ReferenceBinding, Reporting, RuleSpec, StalePolicy, Threshold,
};
