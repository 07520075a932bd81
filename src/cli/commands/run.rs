//! Run command implementation
//!
//! This module implements the `run` command, which extracts, transforms and
//! loads in a single pipeline run, and the plan execution the per-stage
//! commands share with it.

use crate::config::{load_config, StrataConfig};
use crate::core::pipeline::{PipelineCoordinator, RunPlan, RunSummary};
use clap::Args;
use std::io::{self, Write};
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Extract and transform, but only count what the load would write
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");
        execute_plan(config_path, shutdown_signal, self.yes, |config| {
            RunPlan::full(self.dry_run || config.application.dry_run)
        })
        .await
    }
}

/// Loads the configuration, builds the coordinator and executes a plan
///
/// Plans that write to the destination ask for confirmation unless `yes` is set.
pub(crate) async fn execute_plan<F>(
    config_path: &str,
    shutdown_signal: watch::Receiver<bool>,
    yes: bool,
    plan_for: F,
) -> anyhow::Result<i32>
where
    F: FnOnce(&StrataConfig) -> RunPlan,
{
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("Failed to load configuration: {e}");
            return Ok(2); // Configuration error exit code
        }
    };

    let plan = plan_for(&config);

    if plan.dry_run {
        tracing::info!("Dry run mode enabled - no data will be written to the database");
        println!("🔍 DRY RUN MODE - No data will be written to the database");
        println!();
    }

    if plan.load && !plan.dry_run && !yes && !confirm_load(&config)? {
        println!("Run cancelled.");
        return Ok(0);
    }

    let coordinator = match PipelineCoordinator::new(config, shutdown_signal) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create pipeline coordinator");
            eprintln!("Failed to initialize pipeline: {e}");
            return Ok(2);
        }
    };

    println!("🚀 Starting pipeline...");
    println!();

    let summary = match coordinator.execute(plan).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Pipeline failed");
            eprintln!("Pipeline failed: {e}");
            return Ok(2);
        }
    };

    print_summary(&summary);
    Ok(summary.exit_code())
}

fn confirm_load(config: &StrataConfig) -> anyhow::Result<bool> {
    println!("The load stage drops and recreates these tables:");
    for name in config.output_table_names() {
        println!("  - {name}");
    }
    println!();
    print!("Proceed? [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("📊 Run Summary ({}):", summary.run_id);
    println!("  Entity types extracted: {}", summary.entities_extracted);
    println!("  Records extracted: {}", summary.records_extracted);
    println!("  Tables transformed: {}", summary.tables_transformed);
    println!("  Tables loaded: {}", summary.loads.len());
    println!("  Rows loaded: {}", summary.rows_loaded());
    println!("  Run log entries: {}", summary.log_entries.len());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.collisions.is_empty() {
        println!("⚠️  Dimension names seen with more than one URL:");
        for collision in &summary.collisions {
            println!(
                "  - {}.{}: {}",
                collision.table,
                collision.name,
                collision.urls.join(", ")
            );
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            match &error.context {
                Some(context) => println!("  - [{}] {context}: {}", error.stage, error.message),
                None => println!("  - [{}] {}", error.stage, error.message),
            }
        }
        println!();
    }

    if summary.interrupted {
        println!("⚠️  Run interrupted. Completed units are recorded in the run log.");
    } else if summary.is_successful() {
        println!("✅ Run completed successfully!");
    } else {
        println!("⚠️  Run completed with errors");
    }
}
