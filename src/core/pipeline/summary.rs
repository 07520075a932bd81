//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting pipeline results.

use crate::adapters::database::LoadReport;
use crate::core::normalize::DimensionCollision;
use crate::core::runlog::RunLogEntry;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Stage an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunErrorStage {
    Extract,
    Transform,
    Load,
    RunLog,
}

impl fmt::Display for RunErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Load => "load",
            Self::RunLog => "run_log",
        };
        f.write_str(s)
    }
}

/// Error recorded during a run, with the entity type or table it concerns
#[derive(Debug, Clone, Serialize)]
pub struct RunError {
    pub stage: RunErrorStage,
    pub message: String,
    pub context: Option<String>,
}

impl RunError {
    pub fn new(stage: RunErrorStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,

    /// Entity types fetched and snapshotted
    pub entities_extracted: usize,

    /// Records fetched across all entity types
    pub records_extracted: usize,

    /// Normalized tables written to the store
    pub tables_transformed: usize,

    /// Per-table load outcomes
    pub loads: Vec<LoadReport>,

    /// Dimension names seen with more than one URL
    pub collisions: Vec<DimensionCollision>,

    /// Entries appended to the run log
    pub log_entries: Vec<RunLogEntry>,

    pub errors: Vec<RunError>,

    /// Whether a shutdown signal stopped the run early
    pub interrupted: bool,

    pub dry_run: bool,

    #[serde(skip)]
    pub duration: Duration,
}

impl RunSummary {
    /// Create a new empty summary
    pub fn new(run_id: Uuid, dry_run: bool) -> Self {
        Self {
            run_id,
            entities_extracted: 0,
            records_extracted: 0,
            tables_transformed: 0,
            loads: Vec::new(),
            collisions: Vec::new(),
            log_entries: Vec::new(),
            errors: Vec::new(),
            interrupted: false,
            dry_run,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_error(&mut self, error: RunError) {
        self.errors.push(error);
    }

    /// Whether any error was raised in a stage
    pub fn has_errors_in(&self, stage: RunErrorStage) -> bool {
        self.errors.iter().any(|e| e.stage == stage)
    }

    /// Rows written (or counted, on a dry run) across all loaded tables
    pub fn rows_loaded(&self) -> usize {
        self.loads.iter().map(|l| l.rows_inserted).sum()
    }

    /// No errors and not interrupted
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && !self.interrupted
    }

    /// Process exit code: 0 success, 1 completed with errors or interrupted
    pub fn exit_code(&self) -> i32 {
        if self.is_successful() {
            0
        } else {
            1
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            entities_extracted = self.entities_extracted,
            records_extracted = self.records_extracted,
            tables_transformed = self.tables_transformed,
            tables_loaded = self.loads.len(),
            rows_loaded = self.rows_loaded(),
            collisions = self.collisions.len(),
            dry_run = self.dry_run,
            interrupted = self.interrupted,
            duration_secs = self.duration.as_secs_f64(),
            "Pipeline run completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Pipeline run completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    stage = %error.stage,
                    context = error.context.as_deref().unwrap_or(""),
                    message = %error.message,
                    "Pipeline error"
                );
            }
        }
    }
}
