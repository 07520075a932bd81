//! Named tabular data passed between pipeline stages

use super::entity::RawEntity;
use super::errors::StrataError;
use super::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What a table represents, which decides its relational schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Untransformed API records
    Raw,
    /// Normalized entity table keyed by `id`
    Entity,
    /// Deduplicated names of one nested-object field
    Dimension,
    /// (parent id, child id) pairs of one reference-array field
    Junction,
    /// Pipeline run log
    RunLog,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Raw => "raw",
            Self::Entity => "entity",
            Self::Dimension => "dimension",
            Self::Junction => "junction",
            Self::RunLog => "run_log",
        };
        f.write_str(s)
    }
}

/// A named table of JSON cells
///
/// Every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    kind: TableKind,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table
    pub fn new(name: impl Into<String>, kind: TableKind, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a raw table from entities
    ///
    /// Columns are the union of field names in first-seen order. Fields an entity
    /// lacks become null cells.
    pub fn from_entities(name: impl Into<String>, entities: &[RawEntity]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for entity in entities {
            for key in entity.fields().keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = entities
            .iter()
            .map(|entity| {
                columns
                    .iter()
                    .map(|c| entity.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self {
            name: name.into(),
            kind: TableKind::Raw,
            columns,
            rows,
        }
    }

    /// Reads the rows back as raw entities
    ///
    /// # Errors
    ///
    /// Returns an error if a row has no integer `id`.
    pub fn to_entities(&self) -> Result<Vec<RawEntity>> {
        self.rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> =
                    self.columns.iter().cloned().zip(row.iter().cloned()).collect();
                RawEntity::from_value(&self.name, Value::Object(record))
            })
            .collect()
    }

    /// Appends a row
    ///
    /// # Errors
    ///
    /// Returns a validation error if the row width does not match the columns.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(StrataError::Validation(format!(
                "Row with {} cells does not fit table '{}' with {} columns",
                row.len(),
                self.name,
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table kind
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Iterates the cells of one column
    pub fn column(&self, column: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Largest integer in the `id` column, if there is one
    pub fn max_id(&self) -> Option<i64> {
        self.column("id")?
            .filter_map(|cell| match cell {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .max()
    }

    /// Approximate in-memory size in bytes
    ///
    /// Counts a fixed 8 bytes per cell plus the text payload of string and
    /// nested cells, and the column names.
    pub fn approx_size_bytes(&self) -> u64 {
        let header: usize = self.columns.iter().map(String::len).sum();
        let cells: usize = self
            .rows
            .iter()
            .flatten()
            .map(|cell| {
                8 + match cell {
                    Value::String(s) => s.len(),
                    Value::Array(_) | Value::Object(_) => cell.to_string().len(),
                    _ => 0,
                }
            })
            .sum();
        (header + cells) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(value: Value) -> RawEntity {
        RawEntity::from_value("Location", value).unwrap()
    }

    #[test]
    fn test_from_entities_unions_columns() {
        let entities = vec![
            entity(json!({"id": 1, "name": "Earth"})),
            entity(json!({"id": 2, "type": "Planet", "name": "Abadango"})),
        ];

        let table = Table::from_entities("Location", &entities);

        assert_eq!(table.columns(), &["id", "name", "type"]);
        assert_eq!(table.rows()[0], vec![json!(1), json!("Earth"), Value::Null]);
        assert_eq!(table.rows()[1], vec![json!(2), json!("Abadango"), json!("Planet")]);
        assert_eq!(table.kind(), TableKind::Raw);
    }

    #[test]
    fn test_to_entities_round_trip() {
        let entities = vec![
            entity(json!({"id": 3, "residents": ["https://x/api/character/1"]})),
            entity(json!({"id": 4, "residents": []})),
        ];
        let table = Table::from_entities("Location", &entities);

        assert_eq!(table.to_entities().unwrap(), entities);
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = Table::new("Origin", TableKind::Dimension, vec!["origin_name".into()]);
        assert!(table.push_row(vec![json!("Earth")]).is_ok());
        assert!(table.push_row(vec![json!("Earth"), json!(1)]).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_max_id() {
        let entities = vec![
            entity(json!({"id": 7})),
            entity(json!({"id": 42})),
            entity(json!({"id": 3})),
        ];
        assert_eq!(Table::from_entities("Location", &entities).max_id(), Some(42));

        let table = Table::new("Origin", TableKind::Dimension, vec!["origin_name".into()]);
        assert_eq!(table.max_id(), None);
    }

    #[test]
    fn test_approx_size_counts_strings() {
        let mut table = Table::new("Origin", TableKind::Dimension, vec!["n".into()]);
        table.push_row(vec![json!("Earth")]).unwrap();
        assert_eq!(table.approx_size_bytes(), 1 + 8 + 5);
    }
}
