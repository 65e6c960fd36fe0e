//! Error metadata shared by every error type in the workspace.
//!
//! Storage and transfer errors are defined next to the code that raises them;
//! this module only fixes how an error describes itself so that callers can log
//! and surface errors uniformly.

use std::error::Error;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like missing files
    Debug,
    /// Warning level - for refusals the caller can act on
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for logging and for the interface layer.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the operation may succeed if attempted again
    fn is_recoverable(&self) -> bool;

    /// Message safe to show to an end user
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Render an error with its source chain, five levels deep at most.
pub fn detailed_message(err: &dyn Error) -> String {
    let mut details = err.to_string();

    let mut source = err.source();
    let mut depth = 0;
    while let Some(cause) = source {
        depth += 1;
        if depth > 5 {
            details.push_str("\n  ... (truncated)");
            break;
        }
        details.push_str(&format!("\n  Caused by: {}", cause));
        source = cause.source();
    }

    details
}
