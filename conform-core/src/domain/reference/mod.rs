// conform-core/src/domain/reference/mod.rs

pub mod audit;
pub mod binder;
pub mod cache;
pub mod declaration;
pub mod error;
pub mod table;

pub use audit::AuditEvent;
pub use binder::{BindState, BoundReference, FreshnessStatus, ReferenceBinder, ReferenceSet, ReferenceStatus};
pub use cache::ReferenceCache;
pub use declaration::{ReferenceCatalog, ReferenceDecl, ReferenceFormat};
pub use error::ReferenceError;
pub use table::{Lookup, ReferenceRow, ReferenceTable};
