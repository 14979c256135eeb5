// conform-core/src/domain/reference/cache.rs

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::debug;

use super::error::ReferenceError;
use super::table::ReferenceTable;

type Slot = Arc<OnceCell<Arc<ReferenceTable>>>;

/// Process-wide memo of loaded reference tables, keyed by (name, version).
///
/// Concurrent first access to the same key runs the loader once; the other
/// callers wait for its result. A failed load leaves the slot empty so a
/// later bind can retry.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    slots: Mutex<HashMap<(String, String), Slot>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str, version: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .entry((name.to_string(), version.to_string()))
            .or_default()
            .clone()
    }

    pub async fn get_or_load<F, Fut>(
        &self,
        name: &str,
        version: &str,
        load: F,
    ) -> Result<Arc<ReferenceTable>, ReferenceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ReferenceTable, ReferenceError>>,
    {
        let slot = self.slot(name, version);
        if let Some(table) = slot.get() {
            debug!(table = name, version, "Reference cache hit");
            return Ok(table.clone());
        }
        slot.get_or_try_init(|| async move { load().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn get(&self, name: &str, version: &str) -> Option<Arc<ReferenceTable>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .get(&(name.to_string(), version.to_string()))
            .and_then(|slot| slot.get().cloned())
    }

    /// Drops every cached version of `name`.
    pub fn invalidate(&self, name: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.retain(|(n, _), _| n != name);
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.clear();
    }

    /// Number of loaded tables.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::reference::declaration::ReferenceDecl;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn table(name: &str) -> ReferenceTable {
        ReferenceTable::from_rows(
            name,
            &ReferenceDecl::dictionary("k", "v"),
            vec!["k".into(), "v".into()],
            vec![vec![Some("a".into()), Some("1".into())]],
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_first_access_loads_once() -> anyhow::Result<()> {
        let cache = Arc::new(ReferenceCache::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let loads = loads.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_load("titles", "1.0", || async move {
                            loads.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(table("titles"))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await??;
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_versions_are_cached_separately_and_invalidated_together() -> anyhow::Result<()> {
        let cache = ReferenceCache::new();
        cache.get_or_load("t", "1.0", || async { Ok(table("t")) }).await?;
        cache.get_or_load("t", "2.0", || async { Ok(table("t")) }).await?;
        cache.get_or_load("u", "1.0", || async { Ok(table("u")) }).await?;
        assert_eq!(cache.len(), 3);

        cache.invalidate("t");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("t", "1.0").is_none());
        assert!(cache.get("u", "1.0").is_some());

        cache.clear();
        assert!(cache.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = ReferenceCache::new();
        let first = cache
            .get_or_load("t", "1.0", || async {
                Err(ReferenceError::NoPath("t".into()))
            })
            .await;
        assert!(first.is_err());
        assert!(cache.is_empty());

        let second = cache.get_or_load("t", "1.0", || async { Ok(table("t")) }).await;
        assert!(second.is_ok());
    }
}
