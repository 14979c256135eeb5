// conform-core/src/domain/reference/declaration.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::error::DomainError;

pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;
pub const DEFAULT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFormat {
    /// key column -> value column
    Dictionary,
    /// key column -> full row
    #[default]
    #[serde(alias = "dataframe")]
    Frame,
}

/// One entry of `reference_files` in reference_data.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDecl {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub format: ReferenceFormat,
    pub key_column: String,
    #[serde(default)]
    pub value_column: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub description: String,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_max_age() -> u32 {
    DEFAULT_MAX_AGE_DAYS
}

/// Every reference table the process knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    #[serde(default = "default_max_age")]
    pub default_max_age_days: u32,
    #[serde(default)]
    pub audit_log_path: Option<PathBuf>,
    #[serde(default)]
    pub reference_files: BTreeMap<String, ReferenceDecl>,
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self {
            default_max_age_days: DEFAULT_MAX_AGE_DAYS,
            audit_log_path: None,
            reference_files: BTreeMap::new(),
        }
    }
}

impl ReferenceCatalog {
    pub fn with_table(mut self, name: impl Into<String>, decl: ReferenceDecl) -> Self {
        self.reference_files.insert(name.into(), decl);
        self
    }

    pub fn declaration(&self, name: &str) -> Result<&ReferenceDecl, DomainError> {
        self.reference_files
            .get(name)
            .ok_or_else(|| DomainError::ReferenceNotDeclared {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reference_files.contains_key(name)
    }

    /// Freshness limit for `name`: analytic override, then the table's own, then the default.
    pub fn max_age_for(&self, name: &str, override_days: Option<u32>) -> u32 {
        override_days
            .or_else(|| self.reference_files.get(name).and_then(|d| d.max_age_days))
            .unwrap_or(self.default_max_age_days)
    }
}

impl ReferenceDecl {
    pub fn dictionary(
        key_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            path: None,
            format: ReferenceFormat::Dictionary,
            key_column: key_column.into(),
            value_column: Some(value_column.into()),
            version: default_version(),
            max_age_days: None,
            description: String::new(),
        }
    }

    pub fn frame(key_column: impl Into<String>) -> Self {
        Self {
            path: None,
            format: ReferenceFormat::Frame,
            key_column: key_column.into(),
            value_column: None,
            version: default_version(),
            max_age_days: None,
            description: String::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_max_age(mut self, days: u32) -> Self {
        self.max_age_days = Some(days);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}
