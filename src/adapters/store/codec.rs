//! CSV encoding of tables
//!
//! Writing: the header row holds the column names; strings are written raw,
//! numbers and booleans as their text, arrays and objects as compact JSON, and
//! null as an empty cell.
//!
//! Reading: every non-empty cell comes back as a string and every empty cell as
//! null, so an empty string also reads back as null. For raw and entity tables
//! the `id` column is parsed back to integers. Nested values therefore return as
//! JSON text, which the normalization engine accepts in place of the original
//! object.
//!
//! A table without columns is an empty blob.

use crate::domain::{Result, StoreError, Table, TableKind};
use serde_json::Value;

/// Encodes a table as CSV bytes
///
/// # Errors
///
/// Returns `StoreError::Codec` if the CSV writer fails.
pub fn encode_table(table: &Table) -> Result<Vec<u8>> {
    let codec_error = |e: csv::Error| StoreError::Codec {
        table: table.name().to_string(),
        message: e.to_string(),
    };

    if table.columns().is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns()).map_err(codec_error)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(cell_text))
            .map_err(codec_error)?;
    }

    writer.into_inner().map_err(|e| {
        StoreError::Codec {
            table: table.name().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Decodes CSV bytes into a table
///
/// # Errors
///
/// Returns `StoreError::Codec` if the bytes are not valid CSV or a row's width
/// differs from the header's.
pub fn decode_table(name: &str, kind: TableKind, bytes: &[u8]) -> Result<Table> {
    let codec_error = |message: String| StoreError::Codec {
        table: name.to_string(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let mut columns: Vec<String> = reader
        .headers()
        .map_err(|e| codec_error(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    // a lone empty header is how a column-less table used to be written
    if columns.len() == 1 && columns[0].is_empty() {
        columns.clear();
    }

    let id_index = match kind {
        TableKind::Raw | TableKind::Entity => columns.iter().position(|c| c == "id"),
        _ => None,
    };

    let mut table = Table::new(name, kind, columns);
    if table.columns().is_empty() {
        return Ok(table);
    }

    for record in reader.records() {
        let record = record.map_err(|e| codec_error(e.to_string()))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(i, cell)| parse_cell(cell, Some(i) == id_index))
            .collect();
        table.push_row(row)?;
    }

    Ok(table)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_cell(cell: &str, is_id: bool) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if is_id {
        if let Ok(id) = cell.trim().parse::<i64>() {
            return Value::from(id);
        }
    }
    Value::String(cell.to_string())
}
