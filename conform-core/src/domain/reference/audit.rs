// conform-core/src/domain/reference/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured staleness event handed to the audit sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub table: String,
    pub version: String,
    pub age_days: i64,
    pub max_age_days: u32,
    pub stale: bool,
    pub timestamp: DateTime<Utc>,
}
