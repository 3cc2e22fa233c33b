//! Header-delimited flat file reader with per-column type inference

use std::collections::HashSet;
use std::path::Path;

use crate::dataset::{DataType, Field, Schema, Table, Value};
use super::error::LoadError;

/// Candidate types, narrowest first
const INFERENCE_ORDER: [DataType; 3] = [DataType::Int, DataType::Float, DataType::Bool];

/// Read a delimited file with a header row into a table named `name`
pub fn read_delimited(name: &str, path: &Path, delimiter: u8) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(LoadError::DuplicateColumn {
                name: name.to_string(),
                column: header.clone(),
            });
        }
    }

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        for (idx, cell) in record.iter().enumerate() {
            raw_columns[idx].push(cell.to_string());
        }
    }

    let mut fields = Vec::with_capacity(headers.len());
    let mut columns = Vec::with_capacity(headers.len());
    for (header, raw) in headers.into_iter().zip(raw_columns) {
        let data_type = infer_type(&raw);
        let values = raw
            .iter()
            .map(|cell| Value::parse_as(cell, data_type).unwrap_or(Value::Null))
            .collect();
        fields.push(Field::new(header, data_type));
        columns.push(values);
    }

    let row_count = columns.first().map(Vec::len).unwrap_or(0);
    tracing::debug!(dataset = name, path = %path.display(), rows = row_count, "read dataset");

    Table::from_columns(name, Schema::new(fields), columns).ok_or_else(|| LoadError::Malformed {
        name: name.to_string(),
    })
}

/// Pick the narrowest type every non-empty cell parses as
pub fn infer_type(cells: &[String]) -> DataType {
    let non_empty: Vec<&str> = cells
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if non_empty.is_empty() {
        return DataType::String;
    }
    INFERENCE_ORDER
        .into_iter()
        .find(|candidate| {
            non_empty
                .iter()
                .all(|cell| Value::parse_as(cell, *candidate).is_some())
        })
        .unwrap_or(DataType::String)
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
