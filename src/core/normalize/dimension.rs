//! Dimension table extraction
//!
//! A dimension holds the distinct display names of one nested-object field. Rows
//! are keyed by exact string equality and kept in first-occurrence order.

use super::flatten::ObjectReference;
use crate::domain::{Result, Table, TableKind};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// One display name that pointed at more than one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionCollision {
    /// Dimension table
    pub table: String,
    /// The shared display name
    pub name: String,
    /// Every distinct non-empty URL seen for the name, first-seen order
    pub urls: Vec<String>,
}

/// Accumulates distinct names for one dimension table
#[derive(Debug)]
pub struct DimensionBuilder {
    table: String,
    column: String,
    names: Vec<String>,
    urls: HashMap<String, Vec<String>>,
}

impl DimensionBuilder {
    /// Starts an empty dimension with a single `column`
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            names: Vec::new(),
            urls: HashMap::new(),
        }
    }

    /// Records one occurrence of a nested-object value
    pub fn observe(&mut self, reference: &ObjectReference) {
        let urls = match self.urls.get_mut(&reference.name) {
            Some(urls) => urls,
            None => {
                self.names.push(reference.name.clone());
                self.urls.entry(reference.name.clone()).or_default()
            }
        };

        if !reference.url.is_empty() && !urls.contains(&reference.url) {
            urls.push(reference.url.clone());
        }
    }

    /// Distinct names seen so far
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing was observed
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names whose occurrences disagree on the URL
    pub fn collisions(&self) -> Vec<DimensionCollision> {
        self.names
            .iter()
            .filter_map(|name| {
                let urls = self.urls.get(name)?;
                (urls.len() > 1).then(|| DimensionCollision {
                    table: self.table.clone(),
                    name: name.clone(),
                    urls: urls.clone(),
                })
            })
            .collect()
    }

    /// Builds the dimension table
    ///
    /// # Errors
    ///
    /// Propagates the table's row width check.
    pub fn build(self) -> Result<Table> {
        let mut table = Table::new(self.table, TableKind::Dimension, vec![self.column]);
        for name in self.names {
            table.push_row(vec![Value::String(name)])?;
        }
        Ok(table)
    }
}
