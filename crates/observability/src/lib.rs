//! Tracing/logging setup shared by binaries.

pub mod tracing;

pub use tracing::{LOG_FORMAT_VAR, LogFormat, ParseLogFormatError};

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    tracing::init();
}
