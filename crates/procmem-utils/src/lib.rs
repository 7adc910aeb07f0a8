//! # procmem Utilities
//!
//! Shared helpers for programs embedding `procmem-core`.
//!
//! Currently this is the logging setup built on `tracing`: the core crate
//! emits events, this crate installs the subscriber that prints or files them.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    dated_log_file_name, init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel,
    LoggingError,
};
pub use tracing::{debug, error, info, trace, warn};
