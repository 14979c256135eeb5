// conform-core/src/infrastructure/adapters/memory.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::reference::{ReferenceDecl, ReferenceError, ReferenceTable};
use crate::ports::reference_loader::ReferenceLoader;

struct Fixture {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    last_refreshed: DateTime<Utc>,
}

/// Reference tables held in memory, for embedding callers and tests.
#[derive(Default)]
pub struct InMemoryReferenceLoader {
    tables: HashMap<String, Fixture>,
    delay: Option<Duration>,
    loads: AtomicUsize,
}

impl InMemoryReferenceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(
        mut self,
        name: impl Into<String>,
        columns: &[&str],
        rows: &[Vec<&str>],
        last_refreshed: DateTime<Utc>,
    ) -> Self {
        let fixture = Fixture {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    r.iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect()
                })
                .collect(),
            last_refreshed,
        };
        self.tables.insert(name.into(), fixture);
        self
    }

    /// Every load sleeps this long first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReferenceLoader for InMemoryReferenceLoader {
    async fn load(&self, name: &str, decl: &ReferenceDecl) -> Result<ReferenceTable, ReferenceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let fixture = self.tables.get(name).ok_or_else(|| ReferenceError::Io {
            path: format!("memory:{name}"),
            reason: "no such table".to_string(),
        })?;
        ReferenceTable::from_rows(
            name,
            decl,
            fixture.columns.clone(),
            fixture.rows.clone(),
            fixture.last_refreshed,
        )
    }
}
