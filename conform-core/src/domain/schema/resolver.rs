// conform-core/src/domain/schema/resolver.rs

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::mapping::{ColumnMapping, DataType};
use super::table::{ColumnInfo, NormalizedTable, RawTable};
use super::value::CellValue;
use crate::domain::error::DomainError;

/// A cell whose raw text could not be coerced to its declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellCoercionIssue {
    pub row: usize,
    pub column: String,
    pub raw: String,
    pub expected: DataType,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub table: NormalizedTable,
    pub issues: Vec<CellCoercionIssue>,
    /// Raw headers kept as passthrough columns.
    pub unmatched: Vec<String>,
    /// Raw headers that matched a target already claimed by an earlier column.
    pub shadowed: Vec<String>,
}

pub struct SchemaResolver<'a> {
    mappings: &'a [ColumnMapping],
}

enum Slot<'m> {
    Mapped(&'m ColumnMapping),
    Passthrough,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(mappings: &'a [ColumnMapping]) -> Self {
        Self { mappings }
    }

    /// Normalizes `raw` into the canonical schema and checks `required` fields.
    ///
    /// Coercion failures never abort: the cell becomes `CellValue::Invalid` and
    /// the failure is listed in `Resolution::issues`.
    #[instrument(skip_all, fields(rows = raw.len(), headers = raw.headers.len()))]
    pub fn resolve(&self, raw: &RawTable, required: &[String]) -> Result<Resolution, DomainError> {
        let mut claimed: HashSet<&str> = HashSet::new();
        let mut slots = Vec::with_capacity(raw.headers.len());
        let mut columns = Vec::with_capacity(raw.headers.len());
        let mut unmatched = Vec::new();
        let mut shadowed = Vec::new();

        // 1. Header matching (first column wins a target)
        for header in &raw.headers {
            let hit = self.mappings.iter().find(|m| m.matches(header));
            match hit {
                Some(mapping) if claimed.insert(mapping.target.as_str()) => {
                    debug!(header = %header, target = %mapping.target, "Mapped column");
                    columns.push(ColumnInfo {
                        name: mapping.target.clone(),
                        source_header: header.clone(),
                        data_type: Some(mapping.data_type),
                    });
                    slots.push(Slot::Mapped(mapping));
                }
                Some(mapping) => {
                    warn!(header = %header, target = %mapping.target, "Column shadowed by an earlier match");
                    shadowed.push(header.clone());
                    columns.push(passthrough(header));
                    slots.push(Slot::Passthrough);
                }
                None => {
                    unmatched.push(header.clone());
                    columns.push(passthrough(header));
                    slots.push(Slot::Passthrough);
                }
            }
        }

        // 2. Coercion
        let mut issues = Vec::new();
        let rows = (0..raw.len())
            .map(|row| {
                slots
                    .iter()
                    .enumerate()
                    .map(|(col, slot)| {
                        let cell = raw.cell(row, col);
                        match slot {
                            Slot::Passthrough => CellValue::coerce(cell, DataType::String)
                                .unwrap_or(CellValue::Null),
                            Slot::Mapped(mapping) => {
                                match CellValue::coerce(cell, mapping.data_type) {
                                    Ok(value) => value,
                                    Err(raw_text) => {
                                        issues.push(CellCoercionIssue {
                                            row,
                                            column: mapping.target.clone(),
                                            raw: raw_text.clone(),
                                            expected: mapping.data_type,
                                        });
                                        CellValue::Invalid(raw_text)
                                    }
                                }
                            }
                        }
                    })
                    .collect()
            })
            .collect();

        let table = NormalizedTable::new(columns, rows);

        // 3. Required fields, reported all at once
        let mut seen = HashSet::new();
        let missing: Vec<String> = required
            .iter()
            .filter(|field| seen.insert(field.as_str()))
            .filter(|field| !table.has_column(field))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::Schema { missing });
        }

        if !issues.is_empty() {
            warn!(count = issues.len(), "Cells failed type coercion");
        }
        info!(
            rows = table.len(),
            canonical = table.canonical_columns().count(),
            passthrough = unmatched.len() + shadowed.len(),
            "Input normalized"
        );

        Ok(Resolution {
            table,
            issues,
            unmatched,
            shadowed,
        })
    }
}

fn passthrough(header: &str) -> ColumnInfo {
    ColumnInfo {
        name: header.trim().to_string(),
        source_header: header.to_string(),
        data_type: None,
    }
}
