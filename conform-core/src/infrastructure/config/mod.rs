// conform-core/src/infrastructure/config/mod.rs

pub mod analytics;
pub mod data_sources;
pub mod project;
pub mod reference;

pub use analytics::load_analytics;
pub use data_sources::{DataSourceConfig, DataSourceRegistry};
pub use project::{Project, ProjectSettings, load_project};
pub use reference::load_reference_catalog;

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::infrastructure::error::InfrastructureError;

// --- LOGIQUE GÉNÉRIQUE ---

/// Charge un fragment de configuration typé depuis un fichier YAML.
pub(crate) fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path).map_err(|e| InfrastructureError::read(path, e))?;
    serde_yaml::from_str(&content).map_err(|source| InfrastructureError::YamlError {
        path: path.display().to_string(),
        source,
    })
}

/// First existing `<dir>/<stem>.yaml` or `<dir>/<stem>.yml`.
pub(crate) fn find_yaml(dir: &Path, stem: &str) -> Option<std::path::PathBuf> {
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.exists())
}
