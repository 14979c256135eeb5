// conform-core/src/infrastructure/adapters/reference_files.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, instrument};

use super::csv_table::parse_csv;
use crate::domain::reference::{ReferenceDecl, ReferenceError, ReferenceTable};
use crate::ports::reference_loader::ReferenceLoader;

/// Loads `.csv` reference tables from disk. The file's modification time is
/// the table's refresh date.
#[derive(Debug, Default, Clone)]
pub struct FileReferenceLoader;

impl FileReferenceLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReferenceLoader for FileReferenceLoader {
    #[instrument(skip(self, decl))]
    async fn load(&self, name: &str, decl: &ReferenceDecl) -> Result<ReferenceTable, ReferenceError> {
        let path = decl
            .path
            .clone()
            .ok_or_else(|| ReferenceError::NoPath(name.to_string()))?;
        let name = name.to_string();
        let decl = decl.clone();

        // csv + fs are blocking
        tokio::task::spawn_blocking(move || load_blocking(&name, &decl, path))
            .await
            .map_err(|e| ReferenceError::Io {
                path: "<task>".to_string(),
                reason: e.to_string(),
            })?
    }
}

fn load_blocking(name: &str, decl: &ReferenceDecl, path: PathBuf) -> Result<ReferenceTable, ReferenceError> {
    let display = path.display().to_string();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(ReferenceError::Unsupported { path: display });
    }

    let io_err = |e: std::io::Error| ReferenceError::Io {
        path: display.clone(),
        reason: e.to_string(),
    };
    let file = std::fs::File::open(&path).map_err(io_err)?;
    let modified = file.metadata().and_then(|m| m.modified()).map_err(io_err)?;
    let last_refreshed: DateTime<Utc> = modified.into();

    let (columns, rows) = parse_csv(file).map_err(|e| ReferenceError::Parse {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    debug!(rows = rows.len(), refreshed = %last_refreshed, "Reference file parsed");

    ReferenceTable::from_rows(name, decl, columns, rows, last_refreshed)
}
