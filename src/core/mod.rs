//! Core business logic for Strata.
//!
//! # Modules
//!
//! - [`normalize`] - turns raw entity collections into entity, dimension and junction tables
//! - [`pipeline`] - run orchestration and summaries
//! - [`runlog`] - append-only record of every table each stage produced
//!
//! # Run Workflow
//!
//! 1. **Extract**: page through every configured endpoint and snapshot the raw records
//! 2. **Transform**: normalize all raw snapshots together and snapshot each output table
//! 3. **Load**: replace each destination table with its normalized snapshot
//! 4. **Record**: append one run log entry per table and stage
//!
//! # Example
//!
//! ```rust,no_run
//! use strata::config::load_config;
//! use strata::core::pipeline::{PipelineCoordinator, RunPlan};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("strata.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = PipelineCoordinator::new(config, shutdown_rx)?;
//! let summary = coordinator.execute(RunPlan::full(false)).await?;
//!
//! println!("Loaded {} rows", summary.rows_loaded());
//! # Ok(())
//! # }
//! ```

pub mod normalize;
pub mod pipeline;
pub mod runlog;
