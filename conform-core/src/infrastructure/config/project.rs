// conform-core/src/infrastructure/config/project.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

use super::{DataSourceRegistry, load_analytics, load_fragment, load_reference_catalog};
use crate::domain::analytic::AnalyticConfig;
use crate::domain::reference::ReferenceCatalog;
use crate::domain::schema::ColumnMapping;
use crate::infrastructure::error::InfrastructureError;

pub const ENV_OUTPUT_DIR: &str = "CONFORM_OUTPUT_DIR";
pub const ENV_AUDIT_LOG: &str = "CONFORM_AUDIT_LOG";

/// conform.yaml at the project root. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    /// Relative to `config_dir`.
    #[serde(default = "default_analytics_dir")]
    pub analytics_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Upper bound on one reference table load. Unset means no bound.
    #[serde(default)]
    pub reference_timeout_secs: Option<u64>,
}

fn default_config_dir() -> String {
    "configs".to_string()
}

fn default_analytics_dir() -> String {
    "analytics".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            analytics_dir: default_analytics_dir(),
            output_dir: default_output_dir(),
            reference_timeout_secs: None,
        }
    }
}

/// Everything a run needs from the project directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub settings: ProjectSettings,
    pub analytics: BTreeMap<String, AnalyticConfig>,
    pub data_sources: DataSourceRegistry,
    pub references: ReferenceCatalog,
}

impl Project {
    pub fn analytic(&self, id: &str) -> Result<&AnalyticConfig, InfrastructureError> {
        self.analytics
            .get(id.trim())
            .ok_or_else(|| InfrastructureError::AnalyticNotFound(id.to_string()))
    }

    pub fn mappings_for(&self, config: &AnalyticConfig) -> Vec<ColumnMapping> {
        self.data_sources.mappings_for(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        resolve(&self.root, &self.settings.output_dir)
    }

    pub fn reference_timeout(&self) -> Option<Duration> {
        self.settings.reference_timeout_secs.map(Duration::from_secs)
    }
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project(project_dir: &Path) -> Result<Project, InfrastructureError> {
    // 1. Manifest (optional when the config directory exists)
    let mut settings = match find_main_config(project_dir) {
        Some(path) => {
            info!(path = ?path, "Loading project manifest");
            load_fragment::<ProjectSettings>(&path)?
        }
        None => ProjectSettings::default(),
    };

    let config_dir = resolve(project_dir, &settings.config_dir);
    if !config_dir.is_dir() {
        return Err(InfrastructureError::ConfigNotFound(format!(
            "{} (no conform.yaml and no '{}' directory)",
            project_dir.display(),
            settings.config_dir
        )));
    }

    // 2. Satellites
    let analytics = load_analytics(&config_dir.join(&settings.analytics_dir))?;
    info!(count = analytics.len(), "  📋 Analytics loaded");

    let data_sources = DataSourceRegistry::load(&config_dir)?;
    let mut references = load_reference_catalog(&config_dir, project_dir)?;
    info!(tables = references.reference_files.len(), "  📚 Reference catalog loaded");

    // 3. Environment overrides
    apply_env_overrides(&mut settings, &mut references, project_dir);

    Ok(Project {
        root: project_dir.to_path_buf(),
        settings,
        analytics,
        data_sources,
        references,
    })
}

fn find_main_config(root: &Path) -> Option<PathBuf> {
    ["conform.yaml", "conform.yml"]
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
}

fn resolve(root: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn apply_env_overrides(settings: &mut ProjectSettings, references: &mut ReferenceCatalog, root: &Path) {
    if let Ok(val) = std::env::var(ENV_OUTPUT_DIR) {
        info!(old = ?settings.output_dir, new = ?val, "Overriding output dir via ENV");
        settings.output_dir = val;
    }
    if let Ok(val) = std::env::var(ENV_AUDIT_LOG) {
        info!(old = ?references.audit_log_path, new = ?val, "Overriding audit log via ENV");
        references.audit_log_path = Some(resolve(root, &val));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn scaffold(root: &Path) -> Result<()> {
        let analytics = root.join("configs/analytics");
        fs::create_dir_all(&analytics)?;
        fs::write(
            analytics.join("qa_77.yaml"),
            "analytic_id: 77\nanalytic_name: Approvals\nthresholds: {error_percentage: 5}\nreporting: {group_by: team}\n",
        )?;
        Ok(())
    }

    #[test]
    fn test_loads_without_manifest() -> Result<()> {
        let root = tempdir()?;
        scaffold(root.path())?;

        let project = load_project(root.path())?;
        assert_eq!(project.settings, ProjectSettings::default());
        assert_eq!(project.analytic("77")?.analytic_name, "Approvals");
        assert!(project.data_sources.data_sources.is_empty());
        Ok(())
    }

    #[test]
    fn test_manifest_overrides_defaults() -> Result<()> {
        let root = tempdir()?;
        scaffold(root.path())?;
        fs::write(
            root.path().join("conform.yaml"),
            "output_dir: reports\nreference_timeout_secs: 3\n",
        )?;

        let project = load_project(root.path())?;
        assert_eq!(project.output_dir(), root.path().join("reports"));
        assert_eq!(project.reference_timeout(), Some(Duration::from_secs(3)));
        Ok(())
    }

    #[test]
    fn test_unknown_analytic() -> Result<()> {
        let root = tempdir()?;
        scaffold(root.path())?;
        let project = load_project(root.path())?;
        assert!(matches!(
            project.analytic("404"),
            Err(InfrastructureError::AnalyticNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_empty_dir_is_not_a_project() -> Result<()> {
        let root = tempdir()?;
        let err = load_project(root.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigNotFound(_)));
        Ok(())
    }
}
