//! External system integrations for Strata.
//!
//! - [`api`] - paginated REST source
//! - [`store`] - snapshot blob store and CSV codec
//! - [`database`] - destination abstraction (trait-based)
//! - [`postgresql`] - PostgreSQL destination
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. Each seam is a trait
//! ([`api::PaginatedFetcher`], [`store::BlobStore`], [`database::TableSink`]) and
//! the pipeline coordinator only ever holds trait objects.
//!
//! ```rust,no_run
//! use strata::adapters::api::{PaginatedFetcher, RestApiClient};
//! use strata::adapters::store::{write_table, LocalBlobStore, SnapshotKey};
//! use strata::config::SourceConfig;
//! use strata::domain::Table;
//!
//! # async fn example() -> strata::domain::Result<()> {
//! let source = RestApiClient::new(&SourceConfig::default())?;
//! let episodes = source.fetch("Episode", "episode").await?;
//!
//! let store = LocalBlobStore::new("./data");
//! let table = Table::from_entities("Episode", &episodes);
//! write_table(&store, &SnapshotKey::untransformed("RickAndMorty", "Episode"), &table).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod database;
pub mod postgresql;
pub mod store;
