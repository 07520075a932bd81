//! Status command implementation
//!
//! This module implements the `status` command, which prints the run log.

use crate::adapters::store::LocalBlobStore;
use crate::config::load_config;
use crate::core::pipeline::read_run_log;
use crate::core::runlog::RunLogEntry;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show entries for this table
    #[arg(long)]
    pub table: Option<String>,

    /// Only show the most recent N entries
    #[arg(long)]
    pub limit: Option<usize>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Reading run log");

        println!("📊 Pipeline Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = LocalBlobStore::new(&config.store.root);
        let entries = match read_run_log(&store, &config.store.domain).await {
            Ok(entries) => entries,
            Err(e) => {
                println!("❌ Failed to read the run log");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        if entries.is_empty() {
            println!("No run history found.");
            println!("Run 'strata run' to start the pipeline.");
            return Ok(0);
        }

        let selected = self.select(&entries);
        if selected.is_empty() {
            println!("No run log entries match the specified filters.");
            return Ok(0);
        }

        println!("Showing {} run log entries:", selected.len());
        println!();
        println!(
            "{:<25} {:<15} {:>8} {:>10} {:>6} {:>12} {:<20} {:<36}",
            "Table", "Stage", "Rows", "Latest id", "Cols", "Size (B)", "Run time", "Run id"
        );
        println!("{}", "-".repeat(140));

        for entry in selected {
            println!(
                "{:<25} {:<15} {:>8} {:>10} {:>6} {:>12} {:<20} {:<36}",
                entry.table_name,
                entry.stage.to_string(),
                entry.rows,
                entry
                    .latest_idx
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                entry.cols_size,
                entry.latest_df_size,
                entry.pipeline_run_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry
                    .run_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }

        println!();
        Ok(0)
    }

    /// Applies the table filter, then keeps the most recent `limit` entries
    fn select<'a>(&self, entries: &'a [RunLogEntry]) -> Vec<&'a RunLogEntry> {
        let filtered: Vec<&RunLogEntry> = entries
            .iter()
            .filter(|e| self.table.as_deref().map_or(true, |t| e.table_name == t))
            .collect();

        match self.limit {
            Some(limit) if limit < filtered.len() => filtered[filtered.len() - limit..].to_vec(),
            _ => filtered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runlog::RunStage;
    use chrono::Utc;

    fn entry(table: &str, rows: usize) -> RunLogEntry {
        RunLogEntry {
            table_name: table.to_string(),
            latest_idx: Some(rows as i64),
            latest_df_size: 0,
            rows,
            cols_size: 3,
            pipeline_run_time: Utc::now(),
            stage: RunStage::Ingestion,
            run_id: None,
        }
    }

    #[test]
    fn test_select_filters_by_table() {
        let entries = vec![entry("Episode", 51), entry("Character", 826), entry("Episode", 52)];
        let args = StatusArgs {
            table: Some("Episode".to_string()),
            limit: None,
        };

        let selected = args.select(&entries);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|e| e.table_name == "Episode"));
    }

    #[test]
    fn test_select_keeps_most_recent() {
        let entries = vec![entry("Episode", 51), entry("Character", 826), entry("Location", 126)];
        let args = StatusArgs {
            table: None,
            limit: Some(2),
        };

        let selected = args.select(&entries);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].table_name, "Character");
        assert_eq!(selected[1].table_name, "Location");
    }
}
