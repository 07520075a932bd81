//! PostgreSQL table sink
//!
//! Each table is replaced inside one transaction: drop, create, then a prepared
//! insert per row. The transaction commits only after the last row; on any
//! error it is dropped, which rolls everything back, including the drop.

use super::client::PostgreSQLClient;
use super::models::{SqlValue, TableDef};
use crate::adapters::database::traits::{LoadReport, TableSink};
use crate::domain::{LoadError, Result, Table};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// PostgreSQL implementation of [`TableSink`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new adapter over a client
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn replace_table(
        &self,
        def: &TableDef,
        table: &Table,
        inserted: &mut usize,
    ) -> std::result::Result<(), String> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(|e| e.to_string())?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| format!("Failed to begin transaction: {e}"))?;

        tx.batch_execute(&def.drop_sql())
            .await
            .map_err(|e| format!("Failed to drop table: {e}"))?;
        tx.batch_execute(&def.create_sql())
            .await
            .map_err(|e| format!("Failed to create table: {e}"))?;

        if !table.is_empty() {
            let statement = tx
                .prepare(&def.insert_sql())
                .await
                .map_err(|e| format!("Failed to prepare insert: {e}"))?;

            for (index, row) in table.rows().iter().enumerate() {
                let values: Vec<SqlValue> = def
                    .bind_row(row)
                    .map_err(|e| format!("Row {index}: {e}"))?;
                let params: Vec<&(dyn ToSql + Sync)> = values.iter().map(SqlValue::as_param).collect();

                tx.execute(&statement, &params)
                    .await
                    .map_err(|e| format!("Row {index}: insert failed: {e}"))?;
                *inserted += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit transaction: {e}"))?;

        Ok(())
    }
}

#[async_trait]
impl TableSink for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn load(&self, table: &Table, dry_run: bool) -> Result<LoadReport> {
        if dry_run {
            tracing::info!(
                table = %table.name(),
                rows = table.len(),
                "Dry run: skipping table load"
            );
            return Ok(LoadReport {
                table: table.name().to_string(),
                rows_inserted: table.len(),
                dry_run: true,
            });
        }

        let def = TableDef::for_table(table);
        let mut inserted = 0;

        if let Err(message) = self.replace_table(&def, table, &mut inserted).await {
            tracing::error!(
                table = %table.name(),
                inserted_before_failure = inserted,
                total = table.len(),
                error = %message,
                "Table load rolled back"
            );
            return Err(LoadError::RolledBack {
                table: table.name().to_string(),
                inserted_before_failure: inserted,
                total: table.len(),
                message,
            }
            .into());
        }

        tracing::info!(
            table = %table.name(),
            kind = %table.kind(),
            rows = inserted,
            "Loaded table"
        );

        Ok(LoadReport {
            table: table.name().to_string(),
            rows_inserted: inserted,
            dry_run: false,
        })
    }

    fn describe(&self) -> String {
        self.client.connection_string_safe()
    }
}
