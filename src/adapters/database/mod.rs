//! Destination abstraction layer
//!
//! This module provides a trait-based abstraction over the relational
//! destination, so the pipeline can be driven against a mock sink in tests.

pub mod factory;
pub mod traits;

pub use factory::create_table_sink;
pub use traits::{LoadReport, TableSink};
