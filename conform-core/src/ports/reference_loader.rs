// conform-core/src/ports/reference_loader.rs

// What the binder needs from storage: turn a declaration into a table.
// Where the rows come from (CSV on disk, memory, a service) is the adapter's business.

use crate::domain::reference::{ReferenceDecl, ReferenceError, ReferenceTable};
use async_trait::async_trait;

#[async_trait]
pub trait ReferenceLoader: Send + Sync {
    /// Loads `name` as declared. `last_refreshed` must reflect the source, not the load time.
    async fn load(&self, name: &str, decl: &ReferenceDecl) -> Result<ReferenceTable, ReferenceError>;
}
