// conform-core/src/domain/reference/binder.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::audit::AuditEvent;
use super::cache::ReferenceCache;
use super::declaration::ReferenceCatalog;
use super::error::ReferenceError;
use super::table::{Lookup, ReferenceRow, ReferenceTable};
use crate::ports::{AuditSink, ReferenceLoader};

#[derive(Debug, Clone, PartialEq)]
pub enum BindState {
    Fresh,
    Stale,
    Unavailable { reason: String },
}

/// A reference table as seen by one run.
#[derive(Debug, Clone)]
pub struct BoundReference {
    pub name: String,
    pub version: String,
    pub state: BindState,
    pub table: Option<Arc<ReferenceTable>>,
    pub age_days: Option<i64>,
    pub max_age_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    Fresh,
    Stale,
    Unavailable,
}

/// Freshness report line for one bound table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceStatus {
    pub name: String,
    pub version: String,
    pub status: FreshnessStatus,
    pub age_days: Option<i64>,
    pub max_age_days: u32,
    pub row_count: usize,
    pub last_refreshed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BoundReference {
    fn unavailable(name: &str, version: &str, max_age_days: u32, reason: String) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            state: BindState::Unavailable { reason },
            table: None,
            age_days: None,
            max_age_days,
        }
    }

    /// Unavailable tables answer every lookup with `NotFound`.
    pub fn lookup(&self, key: &str) -> Lookup<'_> {
        match &self.table {
            Some(table) => table.get(key),
            None => Lookup::NotFound,
        }
    }

    pub fn row(&self, key: &str) -> Option<ReferenceRow<'_>> {
        self.table.as_ref().and_then(|t| t.row(key))
    }

    pub fn is_stale(&self) -> bool {
        self.state == BindState::Stale
    }

    pub fn is_available(&self) -> bool {
        self.table.is_some()
    }

    pub fn status(&self) -> ReferenceStatus {
        let (status, reason) = match &self.state {
            BindState::Fresh => (FreshnessStatus::Fresh, None),
            BindState::Stale => (FreshnessStatus::Stale, None),
            BindState::Unavailable { reason } => (FreshnessStatus::Unavailable, Some(reason.clone())),
        };
        ReferenceStatus {
            name: self.name.clone(),
            version: self.version.clone(),
            status,
            age_days: self.age_days,
            max_age_days: self.max_age_days,
            row_count: self.table.as_ref().map_or(0, |t| t.len()),
            last_refreshed: self.table.as_ref().map(|t| t.last_refreshed),
            reason,
        }
    }
}

/// The reference tables bound for one run, by name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    tables: BTreeMap<String, BoundReference>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bound: BoundReference) {
        self.tables.insert(bound.name.clone(), bound);
    }

    pub fn get(&self, name: &str) -> Option<&BoundReference> {
        self.tables.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundReference> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn statuses(&self) -> Vec<ReferenceStatus> {
        self.iter().map(BoundReference::status).collect()
    }
}

impl FromIterator<BoundReference> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = BoundReference>>(iter: I) -> Self {
        let mut set = Self::new();
        for bound in iter {
            set.insert(bound);
        }
        set
    }
}

/// Binds declared reference tables for one run against a shared cache.
pub struct ReferenceBinder<'a> {
    catalog: &'a ReferenceCatalog,
    cache: &'a ReferenceCache,
    loader: &'a dyn ReferenceLoader,
    audit: &'a dyn AuditSink,
    as_of: DateTime<Utc>,
    timeout: Option<Duration>,
}

impl<'a> ReferenceBinder<'a> {
    pub fn new(
        catalog: &'a ReferenceCatalog,
        cache: &'a ReferenceCache,
        loader: &'a dyn ReferenceLoader,
        audit: &'a dyn AuditSink,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            catalog,
            cache,
            loader,
            audit,
            as_of,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Binds `name`, loading it at most once per (name, version).
    ///
    /// Never fails: load errors and timeouts yield an unavailable binding.
    /// A stale binding appends exactly one audit event.
    #[instrument(skip(self), fields(as_of = %self.as_of))]
    pub async fn bind(&self, name: &str, override_max_age: Option<u32>) -> BoundReference {
        let max_age_days = self.catalog.max_age_for(name, override_max_age);
        let decl = match self.catalog.declaration(name) {
            Ok(decl) => decl,
            Err(e) => {
                warn!(table = name, "Reference table not declared");
                return BoundReference::unavailable(name, "", max_age_days, e.to_string());
            }
        };
        let version = decl.version.as_str();

        let load = self
            .cache
            .get_or_load(name, version, || self.loader.load(name, decl));
        let loaded = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, load).await.unwrap_or_else(|_| {
                Err(ReferenceError::Timeout {
                    table: name.to_string(),
                    millis: limit.as_millis(),
                })
            }),
            None => load.await,
        };

        let table = match loaded {
            Ok(table) => table,
            Err(e) => {
                warn!(table = name, error = %e, "Reference table unavailable, lookups will report not found");
                return BoundReference::unavailable(name, version, max_age_days, e.to_string());
            }
        };

        let age_days = (self.as_of - table.last_refreshed).num_days().max(0);
        let stale = age_days > i64::from(max_age_days);
        if stale {
            warn!(
                table = name,
                version,
                age_days,
                max_age_days,
                "Reference table is stale"
            );
            let event = AuditEvent {
                table: name.to_string(),
                version: version.to_string(),
                age_days,
                max_age_days,
                stale: true,
                timestamp: self.as_of,
            };
            if let Err(e) = self.audit.append(&event).await {
                warn!(table = name, error = %e, "Failed to append staleness audit event");
            }
        } else {
            info!(table = name, version, age_days, rows = table.len(), "Reference table bound");
        }

        BoundReference {
            name: name.to_string(),
            version: version.to_string(),
            state: if stale { BindState::Stale } else { BindState::Fresh },
            table: Some(table),
            age_days: Some(age_days),
            max_age_days,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::reference::declaration::ReferenceDecl;
    use crate::error::ConformError;
    use async_trait::async_trait;
    use chrono::Duration as Days;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLoader {
        refreshed: DateTime<Utc>,
        delay: Option<Duration>,
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ReferenceLoader for FixedLoader {
        async fn load(
            &self,
            name: &str,
            decl: &ReferenceDecl,
        ) -> Result<ReferenceTable, ReferenceError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            ReferenceTable::from_rows(
                name,
                decl,
                vec!["Name".into(), "Title".into()],
                vec![vec![Some("Alice".into()), Some("Director".into())]],
                self.refreshed,
            )
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<AuditEvent>>);

    #[async_trait]
    impl AuditSink for RecordingSink {
        async fn append(&self, event: &AuditEvent) -> Result<(), ConformError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn catalog() -> ReferenceCatalog {
        ReferenceCatalog::default().with_table(
            "titles",
            ReferenceDecl::dictionary("Name", "Title").with_max_age(90),
        )
    }

    fn loader(age: i64) -> FixedLoader {
        FixedLoader {
            refreshed: now() - Days::days(age),
            delay: None,
            loads: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_stale_table_is_usable_and_audited_once_per_bind() {
        let (catalog, cache, loader, sink) = (catalog(), ReferenceCache::new(), loader(120), RecordingSink::default());
        let binder = ReferenceBinder::new(&catalog, &cache, &loader, &sink, now());

        let bound = binder.bind("titles", None).await;
        assert!(bound.is_stale());
        assert_eq!(bound.age_days, Some(120));
        assert_eq!(bound.lookup("Alice"), Lookup::Value("Director"));
        assert_eq!(sink.0.lock().unwrap().len(), 1);

        let again = binder.bind("titles", None).await;
        assert!(again.is_stale());
        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].table, "titles");
        assert_eq!(events[0].max_age_days, 90);
        assert!(events[0].stale);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_table_emits_no_audit_event() {
        let (catalog, cache, loader, sink) = (catalog(), ReferenceCache::new(), loader(10), RecordingSink::default());
        let binder = ReferenceBinder::new(&catalog, &cache, &loader, &sink, now());

        let bound = binder.bind("titles", None).await;
        assert_eq!(bound.state, BindState::Fresh);
        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(bound.status().status, FreshnessStatus::Fresh);
        assert_eq!(bound.status().row_count, 1);
    }

    #[tokio::test]
    async fn test_override_max_age_takes_precedence() {
        let (catalog, cache, loader, sink) = (catalog(), ReferenceCache::new(), loader(10), RecordingSink::default());
        let binder = ReferenceBinder::new(&catalog, &cache, &loader, &sink, now());

        let bound = binder.bind("titles", Some(5)).await;
        assert!(bound.is_stale());
        assert_eq!(bound.max_age_days, 5);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_not_found() {
        let catalog = catalog();
        let cache = ReferenceCache::new();
        let sink = RecordingSink::default();
        let loader = FixedLoader {
            delay: Some(Duration::from_millis(500)),
            ..loader(1)
        };
        let binder = ReferenceBinder::new(&catalog, &cache, &loader, &sink, now())
            .with_timeout(Some(Duration::from_millis(20)));

        let bound = binder.bind("titles", None).await;
        assert!(!bound.is_available());
        assert!(matches!(bound.state, BindState::Unavailable { .. }));
        assert_eq!(bound.lookup("Alice"), Lookup::NotFound);
        assert_eq!(bound.status().status, FreshnessStatus::Unavailable);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_undeclared_table_is_unavailable() {
        let (catalog, cache, loader, sink) = (catalog(), ReferenceCache::new(), loader(1), RecordingSink::default());
        let binder = ReferenceBinder::new(&catalog, &cache, &loader, &sink, now());

        let bound = binder.bind("ghost", None).await;
        assert!(!bound.is_available());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
        assert!(bound.status().reason.unwrap().contains("ghost"));
    }
}
