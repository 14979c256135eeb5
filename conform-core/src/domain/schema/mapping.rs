// conform-core/src/domain/schema/mapping.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    String,
    Date,
    Integer,
    Float,
    Category,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Date => "date",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" => Ok(Self::String),
            "date" | "datetime" => Ok(Self::Date),
            "integer" | "int" => Ok(Self::Integer),
            "float" | "number" => Ok(Self::Float),
            "category" => Ok(Self::Category),
            _ => Err(format!("Unknown data type: {}", s)),
        }
    }
}

/// One canonical column and every header spelling that should land on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    #[serde(default, alias = "alias")]
    pub aliases: Vec<String>,
    pub target: String,
    #[serde(default)]
    pub data_type: DataType,
}

impl ColumnMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>, data_type: DataType) -> Self {
        Self {
            source: source.into(),
            aliases: Vec::new(),
            target: target.into(),
            data_type,
        }
    }

    /// Identity mapping: the canonical name is also the expected header.
    pub fn identity(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, data_type)
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Source, target and every alias are accepted spellings.
    pub fn matches(&self, header: &str) -> bool {
        let key = header_key(header);
        if key.is_empty() {
            return false;
        }
        std::iter::once(&self.source)
            .chain(std::iter::once(&self.target))
            .chain(self.aliases.iter())
            .any(|candidate| header_key(candidate) == key)
    }
}

/// Canonical comparison key for a header: trimmed, lowercased, and with runs
/// of whitespace, `_` or `-` collapsed to a single `_`.
pub fn header_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !key.is_empty() {
            key.push('_');
        }
        pending_sep = false;
        key.extend(ch.to_lowercase());
    }
    key
}
