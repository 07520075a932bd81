//! Hierarchical blob keys
//!
//! ```text
//! <domain>/Untransformed/<entity>/<entity>.csv                      latest raw snapshot
//! <domain>/Untransformed/<entity>/YYYY/MM/DD/HH/mm/<entity>.csv     archived raw snapshot
//! <domain>/Transformed/<table>/<table>.csv                          normalized table
//! <domain>/Logs/Logs.csv                                            run log
//! ```

use crate::core::runlog::RUN_LOG_TABLE;
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;
use std::fmt;

/// Top-level area of the store a key lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SnapshotStage {
    Untransformed,
    Transformed,
    Logs,
}

impl SnapshotStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untransformed => "Untransformed",
            Self::Transformed => "Transformed",
            Self::Logs => "Logs",
        }
    }
}

impl fmt::Display for SnapshotStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one table blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotKey {
    domain: String,
    stage: SnapshotStage,
    table: String,
    archived_at: Option<DateTime<Utc>>,
}

impl SnapshotKey {
    /// Fixed key of the latest raw snapshot of an entity type
    pub fn untransformed(domain: &str, entity: &str) -> Self {
        Self {
            domain: domain.to_string(),
            stage: SnapshotStage::Untransformed,
            table: entity.to_string(),
            archived_at: None,
        }
    }

    /// Timestamped archive key of a raw snapshot, to minute precision
    pub fn archived(domain: &str, entity: &str, at: DateTime<Utc>) -> Self {
        Self {
            archived_at: Some(at),
            ..Self::untransformed(domain, entity)
        }
    }

    /// Key of a normalized table
    pub fn transformed(domain: &str, table: &str) -> Self {
        Self {
            domain: domain.to_string(),
            stage: SnapshotStage::Transformed,
            table: table.to_string(),
            archived_at: None,
        }
    }

    /// Key of the run log
    pub fn run_log(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            stage: SnapshotStage::Logs,
            table: RUN_LOG_TABLE.to_string(),
            archived_at: None,
        }
    }

    pub fn stage(&self) -> SnapshotStage {
        self.stage
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.stage)?;
        // the log sits directly under its stage
        if self.stage != SnapshotStage::Logs {
            write!(f, "/{}", self.table)?;
        }
        if let Some(at) = self.archived_at {
            write!(
                f,
                "/{:04}/{:02}/{:02}/{:02}/{:02}",
                at.year(),
                at.month(),
                at.day(),
                at.hour(),
                at.minute()
            )?;
        }
        write!(f, "/{}.csv", self.table)
    }
}
