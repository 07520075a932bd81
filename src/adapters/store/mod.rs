//! Snapshot store
//!
//! Tables are persisted as CSV blobs under hierarchical keys (see [`key`]).
//! [`BlobStore`] is the seam; [`LocalBlobStore`] keeps blobs on the local
//! filesystem. [`write_table`] and [`read_table`] combine a store with the CSV
//! codec.

pub mod codec;
pub mod key;
pub mod local;

pub use codec::{decode_table, encode_table};
pub use key::{SnapshotKey, SnapshotStage};
pub use local::LocalBlobStore;

use crate::domain::{Result, Table, TableKind};
use async_trait::async_trait;

/// Keyed blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes a blob, replacing any existing one
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Reads a blob; `StoreError::NotFound` if the key is absent
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether a blob exists
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Encodes a table and writes it under `key`
pub async fn write_table(store: &dyn BlobStore, key: &SnapshotKey, table: &Table) -> Result<()> {
    let bytes = encode_table(table)?;
    store.put(&key.to_string(), &bytes).await?;
    tracing::info!(
        key = %key,
        table = %table.name(),
        rows = table.len(),
        "Stored table snapshot"
    );
    Ok(())
}

/// Reads the table stored under `key`
pub async fn read_table(store: &dyn BlobStore, key: &SnapshotKey, kind: TableKind) -> Result<Table> {
    let bytes = store.get(&key.to_string()).await?;
    decode_table(key.table(), kind, &bytes)
}
