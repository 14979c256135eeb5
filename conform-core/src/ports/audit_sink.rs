// conform-core/src/ports/audit_sink.rs

use crate::domain::reference::AuditEvent;
use crate::error::ConformError;
use async_trait::async_trait;

/// Append-only receiver of staleness events, shared across runs.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> Result<(), ConformError>;
}
