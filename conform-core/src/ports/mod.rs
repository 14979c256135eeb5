// conform-core/src/ports/mod.rs

pub mod audit_sink;
pub mod reference_loader;

pub use audit_sink::AuditSink;
pub use reference_loader::ReferenceLoader;
