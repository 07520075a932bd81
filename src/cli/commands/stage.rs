//! Single-stage command implementations
//!
//! `extract`, `transform` and `load` each run one stage against the snapshot
//! store. They are independent invocations: `transform` reads whatever raw
//! snapshots the last extract left behind, `load` whatever tables the last
//! transform wrote.

use super::run::execute_plan;
use crate::core::pipeline::RunPlan;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {}

impl ExtractArgs {
    /// Execute the extract command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting extract command");
        execute_plan(config_path, shutdown_signal, true, |_| RunPlan::extract_only()).await
    }
}

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {}

impl TransformArgs {
    /// Execute the transform command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting transform command");
        execute_plan(config_path, shutdown_signal, true, |_| RunPlan::transform_only()).await
    }
}

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Count the rows each table would receive without touching the database
    #[arg(long)]
    pub dry_run: bool,
}

impl LoadArgs {
    /// Execute the load command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting load command");
        execute_plan(config_path, shutdown_signal, self.yes, |config| {
            RunPlan::load_only(self.dry_run || config.application.dry_run)
        })
        .await
    }
}
