// conform-core/src/infrastructure/adapters/mod.rs

pub mod audit_log;
pub mod csv_table;
pub mod memory;
pub mod reference_files;

pub use audit_log::{JsonlAuditSink, MemoryAuditSink};
pub use csv_table::{parse_csv, read_csv_table};
pub use memory::InMemoryReferenceLoader;
pub use reference_files::FileReferenceLoader;
