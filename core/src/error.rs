//! Error types for the portprobe-core library.

use thiserror::Error;

/// Result type alias for portprobe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can escape a port query.
///
/// Per-row and per-process problems never show up here: a malformed socket
/// table row is skipped, and unreadable process metadata leaves the matching
/// `ProcessInfo` field empty. Only losing a whole kernel source is fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// A kernel introspection source could not be opened at all.
    #[error("Kernel source unavailable: {0}")]
    SourceUnavailable(String),

    /// A port range that is empty or starts at port 0.
    #[error("Invalid port range {start}-{end}")]
    InvalidRange { start: u16, end: u16 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
