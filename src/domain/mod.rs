//! Domain models and types for Strata.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Records** ([`RawEntity`], [`EntityCollections`]) as fetched from the source API
//! - **Tables** ([`Table`], [`TableKind`]) exchanged between stages, the snapshot
//!   store and the relational loader
//! - **Error types** ([`StrataError`] and one enum per stage)
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, StrataError>`]:
//!
//! ```rust
//! use strata::domain::{RawEntity, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let entity = RawEntity::from_value("Character", json!({"id": 1, "name": "Rick"}))?;
//!     assert_eq!(entity.id(), 1);
//!     Ok(())
//! }
//! ```

pub mod entity;
pub mod errors;
pub mod result;
pub mod table;

// Re-export commonly used types for convenience
pub use entity::{EntityCollections, RawEntity};
pub use errors::{FetchError, LoadError, NormalizeError, StoreError, StrataError};
pub use result::Result;
pub use table::{Table, TableKind};
