//! Destination abstraction traits
//!
//! This module defines the trait that relational destinations implement to
//! receive normalized tables.

use crate::domain::{Result, Table};
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of loading one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Destination table name
    pub table: String,

    /// Rows written (or that would have been written, on a dry run)
    pub rows_inserted: usize,

    /// Whether writes were skipped
    pub dry_run: bool,
}

/// Relational destination for normalized tables
///
/// A load replaces the destination table: the previous contents are dropped and
/// the table is recreated from the table's kind and columns. Each table is
/// atomic on its own; there is no transaction spanning several tables.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Test the destination connection
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Replace the destination table with the rows of `table`
    ///
    /// # Arguments
    ///
    /// * `table` - Table to load
    /// * `dry_run` - If true, skip all writes and only report the row count
    ///
    /// # Errors
    ///
    /// Returns `LoadError::RolledBack` if any statement fails; the destination is
    /// then left as it was before the call.
    async fn load(&self, table: &Table, dry_run: bool) -> Result<LoadReport>;

    /// Human-readable destination description, safe to log
    fn describe(&self) -> String;
}
