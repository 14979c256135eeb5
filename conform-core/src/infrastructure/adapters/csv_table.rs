// conform-core/src/infrastructure/adapters/csv_table.rs

use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::schema::RawTable;
use crate::infrastructure::error::InfrastructureError;

/// Reads a headed CSV file. Ragged rows are accepted; blank cells become `None`.
#[instrument]
pub fn read_csv_table(path: &Path) -> Result<RawTable, InfrastructureError> {
    let file = std::fs::File::open(path).map_err(|e| InfrastructureError::read(path, e))?;
    let (headers, rows) = parse_csv(file).map_err(|source| InfrastructureError::CsvError {
        path: path.display().to_string(),
        source,
    })?;
    info!(rows = rows.len(), columns = headers.len(), "Input file read");
    Ok(RawTable::new(headers, rows))
}

/// Header row plus records, shared by input and reference file readers.
#[allow(clippy::type_complexity)]
pub fn parse_csv<R: Read>(reader: R) -> Result<(Vec<String>, Vec<Vec<Option<String>>>), csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|cell| (!cell.trim().is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }
    Ok((headers, rows))
}
