//! Pipeline orchestration
//!
//! The [`PipelineCoordinator`] drives the extract, transform and load stages
//! over the adapters and records every run in the run log.

pub mod coordinator;
pub mod summary;

pub use coordinator::{append_run_log, read_run_log, PipelineCoordinator, RunPlan};
pub use summary::{RunError, RunErrorStage, RunSummary};
