// conform-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::perf)]

// --- MODULES HEXAGONAUX ---

// 1. Ports (Interfaces / Traits)
// Contracts for reference loading and the audit sink.
pub mod ports;

// 2. Domain (Cœur du métier)
// Schema resolution, reference binding, rules, classification, aggregation.
// Depends on nothing but the ports.
pub mod domain;

// 3. Infrastructure (Adapters)
// YAML config, CSV tables, reference files, audit log, report files.
pub mod infrastructure;

// 4. Application (Use Cases)
// One run per (analytic, data file), batches of runs.
pub mod application;

pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::ConformError;
