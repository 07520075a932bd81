//! PostgreSQL destination
//!
//! This module loads normalized tables into PostgreSQL, one transaction per
//! table.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::{quote_ident, ColumnType, TableDef};
