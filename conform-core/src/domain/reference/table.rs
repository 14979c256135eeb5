// conform-core/src/domain/reference/table.rs

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::declaration::{ReferenceDecl, ReferenceFormat};
use super::error::ReferenceError;

/// Result of a key lookup. `NotFound` and `Null` are distinct outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Value(&'a str),
    /// Key present, value cell empty.
    Null,
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn value(self) -> Option<&'a str> {
        match self {
            Lookup::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_found(self) -> bool {
        !matches!(self, Lookup::NotFound)
    }
}

/// An in-memory reference table with O(1) key lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    pub name: String,
    pub version: String,
    pub format: ReferenceFormat,
    pub key_column: String,
    pub value_column: Option<String>,
    pub columns: Vec<String>,
    pub last_refreshed: DateTime<Utc>,
    pub max_age_days: Option<u32>,
    value_idx: Option<usize>,
    rows: HashMap<String, Vec<Option<String>>>,
}

/// Borrowed view over one row of a frame table.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRow<'a> {
    columns: &'a [String],
    cells: &'a [Option<String>],
}

impl<'a> ReferenceRow<'a> {
    pub fn get(&self, column: &str) -> Lookup<'a> {
        let Some(i) = self.columns.iter().position(|c| c == column) else {
            return Lookup::NotFound;
        };
        match self.cells.get(i).and_then(|c| c.as_deref()) {
            Some(v) => Lookup::Value(v),
            None => Lookup::Null,
        }
    }
}

impl ReferenceTable {
    /// Builds the keyed table from parsed rows.
    ///
    /// Keys and cells are trimmed; blank keys are skipped and the last
    /// duplicate key wins.
    pub fn from_rows(
        name: &str,
        decl: &ReferenceDecl,
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
        last_refreshed: DateTime<Utc>,
    ) -> Result<Self, ReferenceError> {
        let position = |column: &str| {
            columns
                .iter()
                .position(|c| c.trim() == column.trim())
                .ok_or_else(|| ReferenceError::MissingColumn {
                    table: name.to_string(),
                    column: column.to_string(),
                })
        };

        let key_idx = position(&decl.key_column)?;
        let value_idx = match (&decl.format, &decl.value_column) {
            (ReferenceFormat::Dictionary, None) => {
                return Err(ReferenceError::MissingValueColumn(name.to_string()));
            }
            (_, Some(col)) => Some(position(col)?),
            (ReferenceFormat::Frame, None) => None,
        };

        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let mut keyed = HashMap::with_capacity(rows.len());
        for row in rows {
            let cells: Vec<Option<String>> = (0..columns.len())
                .map(|i| {
                    row.get(i)
                        .and_then(|c| c.as_deref())
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                })
                .collect();
            if let Some(key) = cells.get(key_idx).cloned().flatten() {
                keyed.insert(key, cells);
            }
        }

        Ok(Self {
            name: name.to_string(),
            version: decl.version.clone(),
            format: decl.format,
            key_column: decl.key_column.clone(),
            value_column: decl.value_column.clone(),
            columns,
            last_refreshed,
            max_age_days: decl.max_age_days,
            value_idx,
            rows: keyed,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rows.contains_key(key.trim())
    }

    /// Value-column lookup. Without a value column, a present key yields itself.
    pub fn get(&self, key: &str) -> Lookup<'_> {
        let Some((stored_key, cells)) = self.rows.get_key_value(key.trim()) else {
            return Lookup::NotFound;
        };
        match self.value_idx {
            Some(i) => match cells.get(i).and_then(|c| c.as_deref()) {
                Some(v) => Lookup::Value(v),
                None => Lookup::Null,
            },
            None => Lookup::Value(stored_key.as_str()),
        }
    }

    pub fn row(&self, key: &str) -> Option<ReferenceRow<'_>> {
        self.rows.get(key.trim()).map(|cells| ReferenceRow {
            columns: &self.columns,
            cells,
        })
    }
}
