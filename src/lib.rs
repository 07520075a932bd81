// Strata - Paginated API to PostgreSQL ETL Tool
// Copyright (c) 2025 Strata Contributors
// Licensed under the MIT License

//! # Strata - Paginated API to PostgreSQL ETL
//!
//! Strata pulls every page of a paginated REST API, snapshots the raw records as
//! CSV, normalizes them into relational tables and loads those tables into
//! PostgreSQL.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** entity collections by following `info.next` page links
//! - **Snapshotting** raw and normalized tables under timestamped keys
//! - **Normalizing** nested objects into dimension tables and URL arrays into
//!   junction tables
//! - **Loading** each table into PostgreSQL in its own transaction
//! - **Recording** every table each stage produced in an append-only run log
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (normalization, pipeline, run log)
//! - [`adapters`] - External integrations (REST source, blob store, PostgreSQL)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strata::config::load_config;
//! use strata::core::pipeline::{PipelineCoordinator, RunPlan};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("strata.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let coordinator = PipelineCoordinator::new(config, shutdown_rx)?;
//!     let summary = coordinator.execute(RunPlan::full(false)).await?;
//!
//!     println!("Loaded {} rows", summary.rows_loaded());
//!     Ok(())
//! }
//! ```
//!
//! ## Normalization
//!
//! The engine works on in-memory collections and is usable on its own:
//!
//! ```rust
//! use serde_json::json;
//! use strata::core::normalize::{normalize, EntitySchema};
//! use strata::domain::{EntityCollections, RawEntity};
//!
//! # fn main() -> strata::domain::Result<()> {
//! let mut collections = EntityCollections::new();
//! collections.insert(
//!     "Location",
//!     vec![RawEntity::from_value(
//!         "Location",
//!         json!({"id": 3, "name": "Citadel of Ricks", "residents": ["https://x/api/character/8"]}),
//!     )?],
//! );
//!
//! let schema = EntitySchema::new("Location").with_reference(
//!     "residents",
//!     "LocationResident",
//!     "location_id",
//!     "resident_id",
//! );
//! let output = normalize(&collections, &[schema])?;
//!
//! let junction = output.get("LocationResident").unwrap();
//! assert_eq!(junction.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error type
//! [`domain::StrataError`] wraps one error enum per stage:
//!
//! ```rust,no_run
//! use strata::domain::StrataError;
//!
//! fn example() -> Result<(), StrataError> {
//!     let config = strata::config::load_config("strata.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Strata uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(entity_type = "Episode", pages = 3, "Fetched entity collection");
//! warn!(table = "Origin", name = "Earth", "Dimension name seen with more than one URL");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
