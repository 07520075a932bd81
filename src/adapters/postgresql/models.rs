//! Relational schema derivation and value conversion
//!
//! The destination table is derived from the table's kind and columns:
//!
//! | kind      | `id`                   | other columns      |
//! |-----------|------------------------|--------------------|
//! | entity    | `BIGINT PRIMARY KEY`   | `VARCHAR`          |
//! | junction  | -                      | `BIGINT NOT NULL`  |
//! | dimension | -                      | `VARCHAR`          |
//! | raw, log  | `BIGINT`               | `VARCHAR`          |

use crate::domain::{Table, TableKind};
use serde_json::Value;
use tokio_postgres::types::ToSql;

/// SQL type of a destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Varchar,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::BigInt => "BIGINT",
            Self::Varchar => "VARCHAR",
        }
    }
}

/// One destination column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Destination table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Derives the destination schema of a table
    pub fn for_table(table: &Table) -> Self {
        let columns = table
            .columns()
            .iter()
            .map(|name| {
                let is_id = name == "id";
                let (column_type, not_null, primary_key) = match table.kind() {
                    TableKind::Entity if is_id => (ColumnType::BigInt, true, true),
                    TableKind::Junction => (ColumnType::BigInt, true, false),
                    TableKind::Raw | TableKind::RunLog if is_id => (ColumnType::BigInt, false, false),
                    _ => (ColumnType::Varchar, false, false),
                };
                ColumnDef {
                    name: name.clone(),
                    column_type,
                    not_null,
                    primary_key,
                }
            })
            .collect();

        Self {
            name: table.name().to_string(),
            columns,
        }
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(&self.name))
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut sql = format!("{} {}", quote_ident(&c.name), c.column_type.as_sql());
                if c.primary_key {
                    sql.push_str(" PRIMARY KEY");
                } else if c.not_null {
                    sql.push_str(" NOT NULL");
                }
                sql
            })
            .collect();
        format!("CREATE TABLE {} ({})", quote_ident(&self.name), columns.join(", "))
    }

    pub fn insert_sql(&self) -> String {
        let names: Vec<String> = self.columns.iter().map(|c| quote_ident(&c.name)).collect();
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("${i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.name),
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// Converts one row to statement parameters
    ///
    /// # Errors
    ///
    /// Returns a description of the first cell that does not fit its column.
    pub fn bind_row(&self, row: &[Value]) -> Result<Vec<SqlValue>, String> {
        self.columns
            .iter()
            .zip(row)
            .map(|(column, cell)| SqlValue::convert(column, cell))
            .collect()
    }
}

/// A converted cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    BigInt(Option<i64>),
    Text(Option<String>),
}

impl SqlValue {
    fn convert(column: &ColumnDef, cell: &Value) -> Result<Self, String> {
        match column.column_type {
            ColumnType::BigInt => {
                let value = match cell {
                    Value::Null => None,
                    Value::Number(n) => Some(n.as_i64().ok_or_else(|| {
                        format!("column '{}' expects an integer, got {n}", column.name)
                    })?),
                    Value::String(s) if s.is_empty() => None,
                    Value::String(s) => Some(s.trim().parse::<i64>().map_err(|_| {
                        format!("column '{}' expects an integer, got '{s}'", column.name)
                    })?),
                    other => {
                        return Err(format!(
                            "column '{}' expects an integer, got {other}",
                            column.name
                        ))
                    }
                };
                if value.is_none() && column.not_null {
                    return Err(format!("column '{}' cannot be null", column.name));
                }
                Ok(Self::BigInt(value))
            }
            ColumnType::Varchar => Ok(Self::Text(match cell {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })),
        }
    }

    pub fn as_param(&self) -> &(dyn ToSql + Sync) {
        match self {
            Self::BigInt(v) => v,
            Self::Text(v) => v,
        }
    }
}

/// Double-quotes an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
