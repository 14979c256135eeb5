// conform-core/src/infrastructure/config/reference.rs

use std::path::Path;
use tracing::{info, instrument, warn};

use super::{find_yaml, load_fragment};
use crate::domain::reference::ReferenceCatalog;
use crate::infrastructure::error::InfrastructureError;

pub const DEFAULT_AUDIT_LOG: &str = "logs/reference_data_audit.jsonl";

/// Loads reference_data.yaml from `config_dir`. Relative table and audit log
/// paths are resolved against `project_root`.
#[instrument]
pub fn load_reference_catalog(
    config_dir: &Path,
    project_root: &Path,
) -> Result<ReferenceCatalog, InfrastructureError> {
    let mut catalog = match find_yaml(config_dir, "reference_data") {
        Some(path) => {
            let catalog: ReferenceCatalog = load_fragment(&path)?;
            info!(tables = catalog.reference_files.len(), "Reference catalog loaded");
            catalog
        }
        None => {
            warn!("No reference_data.yaml found, no reference tables declared");
            ReferenceCatalog::default()
        }
    };

    for decl in catalog.reference_files.values_mut() {
        if let Some(path) = decl.path.as_mut() {
            if path.is_relative() {
                *path = project_root.join(&*path);
            }
        }
    }
    let audit = catalog
        .audit_log_path
        .take()
        .unwrap_or_else(|| DEFAULT_AUDIT_LOG.into());
    catalog.audit_log_path = Some(if audit.is_relative() {
        project_root.join(audit)
    } else {
        audit
    });

    Ok(catalog)
}
