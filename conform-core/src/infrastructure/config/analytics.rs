// conform-core/src/infrastructure/config/analytics.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use super::load_fragment;
use crate::domain::analytic::AnalyticConfig;
use crate::infrastructure::error::InfrastructureError;

/// Loads every `*.yaml` / `*.yml` analytic in `dir`, keyed by analytic id.
///
/// A missing directory yields no analytics. An unreadable file or a
/// duplicated id stops the load.
#[instrument]
pub fn load_analytics(dir: &Path) -> Result<BTreeMap<String, AnalyticConfig>, InfrastructureError> {
    let mut analytics = BTreeMap::new();
    if !dir.exists() {
        return Ok(analytics);
    }

    let mut paths: Vec<_> = fs::read_dir(dir)
        .map_err(|e| InfrastructureError::read(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    paths.sort();

    let mut origins: BTreeMap<String, String> = BTreeMap::new();
    for path in paths {
        let config: AnalyticConfig = load_fragment(&path)?;
        let id = config.analytic_id.clone();
        if let Some(previous) = origins.insert(id.clone(), path.display().to_string()) {
            return Err(InfrastructureError::ConfigError(format!(
                "analytic id '{id}' is defined in both {previous} and {}",
                path.display()
            )));
        }
        info!(id = %id, path = ?path, "Loaded analytic");
        analytics.insert(id, config);
    }
    Ok(analytics)
}
