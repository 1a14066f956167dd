//! Reading codes out of codelist CSV files.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{CodelistError, Result};

/// Header of the column holding codes. The first column is used when absent.
pub const CODE_COLUMN: &str = "Code";

/// Read the ordered codes of a codelist CSV file.
///
/// The header row is skipped. Values are trimmed, empty codes are dropped
/// and a repeated code keeps its first position.
pub fn read_codes(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| CodelistError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();
    let column = code_column(&headers);

    let mut codes: Vec<String> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| csv_error(path, source))?;
        let Some(value) = record.get(column) else {
            continue;
        };
        let code = value.trim();
        if code.is_empty() || codes.iter().any(|existing| existing == code) {
            continue;
        }
        codes.push(code.to_string());
    }
    Ok(codes)
}

fn code_column(headers: &StringRecord) -> usize {
    headers
        .iter()
        .position(|header| header.trim_matches('\u{feff}').trim() == CODE_COLUMN)
        .unwrap_or(0)
}

fn csv_error(path: &Path, source: csv::Error) -> CodelistError {
    CodelistError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
