// conform-core/src/infrastructure/config/data_sources.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument};

use super::{find_yaml, load_fragment};
use crate::domain::analytic::AnalyticConfig;
use crate::domain::schema::{ColumnMapping, DataType};
use crate::infrastructure::error::InfrastructureError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub columns_mapping: Vec<ColumnMapping>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsMapping {
    pub data_source: String,
    #[serde(default)]
    pub analytics: Vec<serde_yaml::Value>,
}

/// data_sources.yaml: column mappings per source and analytic -> source routing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSourceRegistry {
    #[serde(default)]
    pub settings: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub data_sources: BTreeMap<String, DataSourceConfig>,
    #[serde(default)]
    pub analytics_mapping: Vec<AnalyticsMapping>,
}

impl DataSourceRegistry {
    /// Missing file -> empty registry.
    #[instrument]
    pub fn load(config_dir: &Path) -> Result<Self, InfrastructureError> {
        match find_yaml(config_dir, "data_sources") {
            Some(path) => {
                let registry: Self = load_fragment(&path)?;
                info!(
                    sources = registry.data_sources.len(),
                    mapped = registry.analytics_mapping.len(),
                    "Data source registry loaded"
                );
                Ok(registry)
            }
            None => Ok(Self::default()),
        }
    }

    /// Data source of an analytic: its own declaration, then `analytics_mapping`.
    pub fn source_for<'a>(&'a self, config: &'a AnalyticConfig) -> Option<&'a str> {
        if let Some(name) = &config.data_source.name {
            return Some(name.as_str());
        }
        self.analytics_mapping
            .iter()
            .find(|m| {
                m.analytics.iter().any(|id| match id {
                    serde_yaml::Value::String(s) => s.trim() == config.analytic_id,
                    serde_yaml::Value::Number(n) => n.to_string() == config.analytic_id,
                    _ => false,
                })
            })
            .map(|m| m.data_source.as_str())
    }

    /// Column mappings for a run of `config`.
    ///
    /// Inline mappings come first, then the data source's. Required fields no
    /// mapping targets get an identity string mapping.
    pub fn mappings_for(&self, config: &AnalyticConfig) -> Vec<ColumnMapping> {
        let mut mappings = config.data_source.columns.clone();
        if let Some(source) = self.source_for(config).and_then(|n| self.data_sources.get(n)) {
            mappings.extend(source.columns_mapping.iter().cloned());
        }
        for field in &config.data_source.required_fields {
            if !mappings.iter().any(|m| &m.target == field) {
                debug!(field = %field, "No mapping declared, using identity mapping");
                mappings.push(ColumnMapping::identity(field.clone(), DataType::String));
            }
        }
        mappings
    }
}
