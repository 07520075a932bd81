//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output filtered by level or `RUST_LOG`
//! - JSON-formatted local file logs with daily or hourly rotation
//! - Helper macros for the events every stage emits
//!
//! # Example
//!
//! ```no_run
//! use strata::logging::init_logging;
//! use strata::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use strata::log_stage_start;
///
/// let run_id = uuid::Uuid::new_v4();
/// log_stage_start!("extract", run_id, 3);
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $run_id:expr, $units:expr) => {
        tracing::info!(
            stage = $stage,
            run_id = %$run_id,
            units = $units,
            "Starting stage"
        );
    };
}

/// Log the completion of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use strata::log_stage_complete;
/// use std::time::Duration;
///
/// log_stage_complete!("load", 5, Duration::from_secs(2));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            stage = $stage,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Stage completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use strata::log_error_with_context;
/// use strata::domain::StrataError;
///
/// let error = StrataError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = %$context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn test_macros_expand() {
        let run_id = uuid::Uuid::new_v4();
        crate::log_stage_start!("extract", run_id, 3usize);
        crate::log_stage_complete!("extract", 3usize, Duration::from_millis(12));
        let error = crate::domain::StrataError::Validation("bad row".to_string());
        crate::log_error_with_context!(&error, "Episode");
    }
}
