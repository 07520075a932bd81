//! Domain error types
//!
//! This module defines the error hierarchy for Strata. Each pipeline stage has its own
//! error enum, and all of them convert into [`StrataError`] through `#[from]`.
//! Third-party error types are flattened into messages at the adapter boundary.

use thiserror::Error;

/// Main Strata error type
///
/// This is the primary error type used throughout the application.
/// It wraps the stage-specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source API errors (extract stage)
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Normalization errors (transform stage)
    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Snapshot store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Relational load errors (load stage)
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Database-related errors (generic)
    #[error("Database error: {0}")]
    Database(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors raised while walking a paginated source endpoint
///
/// None of these are retried. A failure on any page aborts extraction
/// for that entity type only.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or HTTP-level failure mid-pagination
    #[error("Transient failure fetching {url}: {message}")]
    Transient { url: String, message: String },

    /// The server answered with a body that is not a page
    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// The source never reported a final page
    #[error("Endpoint {endpoint} exceeded the page limit of {max_pages}")]
    PageLimitExceeded { endpoint: String, max_pages: u32 },
}

/// Errors raised by the normalization engine
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A nested-object or reference-array value does not have the expected shape
    #[error("Malformed reference in {entity}.{field} (id {id}): {reason}")]
    MalformedReference {
        entity: String,
        field: String,
        id: i64,
        reason: String,
    },

    /// A raw record cannot be read as an entity (e.g. no integer `id`)
    #[error("Malformed {entity} record: {reason}")]
    MalformedRecord { entity: String, reason: String },

    /// A configured entity type was not supplied to the engine
    #[error("No collection supplied for entity type '{0}'")]
    MissingCollection(String),

    /// Two output tables would share a name
    #[error("Output table '{0}' would be produced twice")]
    DuplicateTable(String),
}

/// Snapshot store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing a blob failed
    #[error("Failed to write blob '{key}': {message}")]
    Write { key: String, message: String },

    /// Reading a blob failed
    #[error("Failed to read blob '{key}': {message}")]
    Read { key: String, message: String },

    /// The requested blob does not exist
    #[error("Blob not found: {key}")]
    NotFound { key: String },

    /// A blob could not be encoded or decoded as a table
    #[error("Failed to decode table '{table}': {message}")]
    Codec { table: String, message: String },
}

/// Relational load errors
#[derive(Debug, Error)]
pub enum LoadError {
    /// The load transaction failed and was rolled back; the destination is unchanged
    #[error(
        "Load of '{table}' rolled back after {inserted_before_failure}/{total} rows: {message}"
    )]
    RolledBack {
        table: String,
        inserted_before_failure: usize,
        total: usize,
        message: String,
    },

    /// No connection could be obtained from the pool
    #[error("Failed to connect to database: {0}")]
    Connection(String),
}

impl StrataError {
    /// Creates a malformed-reference error
    pub fn malformed_reference(
        entity: impl Into<String>,
        field: impl Into<String>,
        id: i64,
        reason: impl Into<String>,
    ) -> Self {
        NormalizeError::MalformedReference {
            entity: entity.into(),
            field: field.into(),
            id,
            reason: reason.into(),
        }
        .into()
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        StrataError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for StrataError {
    fn from(err: toml::de::Error) -> Self {
        StrataError::Configuration(format!("TOML parse error: {err}"))
    }
}
