//! Configuration management for Strata.
//!
//! Strata reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `STRATA_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use strata::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("strata.toml")?;
//!
//! println!("Source: {}", config.source.base_url);
//! for entity in &config.entities {
//!     println!("{} <- {}", entity.name, entity.endpoint);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level, dry run
//! - [`SourceConfig`] - source API base URL, timeouts, page limit
//! - [`EntityConfig`] - one entry per entity type, with its nested-object and
//!   reference-array fields
//! - [`StoreConfig`] - snapshot store root and key domain
//! - [`PostgreSQLConfig`] - destination database (load stage only)
//! - [`LoggingConfig`] - file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [source]
//! base_url = "https://rickandmortyapi.com/api"
//!
//! [[entities]]
//! name = "Character"
//! endpoint = "character"
//!
//! [[entities.nested]]
//! field = "origin"
//!
//! [[entities.references]]
//! field = "episode"
//! child_column = "episode_id"
//!
//! [store]
//! root = "./data"
//! domain = "RickAndMorty"
//!
//! [postgresql]
//! connection_string = "${STRATA_PG_DSN}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, EntityConfig, Environment, LoggingConfig, NestedFieldConfig,
    PostgreSQLConfig, ReferenceFieldConfig, SourceConfig, StoreConfig, StrataConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
