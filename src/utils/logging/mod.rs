//! Logging utilities for pipeline stages and file operations

pub mod log;

// Re-export commonly used functions for convenience
pub use self::log::{
    log_operation_complete, log_operation_start, log_stage_complete, log_stage_start, log_warning,
};
