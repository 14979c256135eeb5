// conform-core/src/domain/schema/table.rs

use super::mapping::{DataType, header_key};
use super::value::CellValue;
use serde::Serialize;
use std::collections::HashMap;

static NULL_CELL: CellValue = CellValue::Null;

/// Raw tabular input as handed over by the I/O layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Convenience constructor; empty strings become `None`.
    pub fn from_strs(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ragged rows read as `None` past their end.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub source_header: String,
    /// `None` for passthrough columns that matched no mapping.
    pub data_type: Option<DataType>,
}

impl ColumnInfo {
    pub fn is_canonical(&self) -> bool {
        self.data_type.is_some()
    }
}

/// Rows indexed `0..n`, typed per mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    columns: Vec<ColumnInfo>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl NormalizedTable {
    /// Canonical columns win name collisions against passthrough columns.
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate().filter(|(_, c)| c.is_canonical()) {
            index.entry(col.name.clone()).or_insert(i);
        }
        for (i, col) in columns.iter().enumerate().filter(|(_, c)| !c.is_canonical()) {
            index.entry(col.name.clone()).or_insert(i);
        }
        Self {
            columns,
            index,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn canonical_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.is_canonical())
    }

    /// Exact name first, then the same loose spelling rules as the resolver.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        if let Some(&i) = self.index.get(name) {
            return Some(i);
        }
        let key = header_key(name);
        if key.is_empty() {
            return None;
        }
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| header_key(&c.name) == key)
            .min_by_key(|(_, c)| !c.is_canonical())
            .map(|(i, _)| i)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL)
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&CellValue> {
        self.column_index(name).map(|col| self.value(row, col))
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every cell of one column, in record order.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &CellValue> + '_ {
        (0..self.rows.len()).map(move |row| self.value(row, col))
    }
}
