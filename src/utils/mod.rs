//! Utility functions shared by the pipeline stages
//!
//! - `arrow`: column access and typed value extraction
//! - `io`: table reading and dataset writing
//! - `logging`: log messages and progress bars

pub mod arrow;
pub mod io;
pub mod logging;

pub use io::DEFAULT_BATCH_SIZE;
pub use logging::{log_operation_complete, log_operation_start, log_warning};
