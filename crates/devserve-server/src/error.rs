//! Error types for the development server.

use std::path::PathBuf;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A listener could not be bound.
    #[error("Failed to bind {what} listener on {address}: {source}")]
    Bind {
        /// Which listener failed ("HTTP" or "live reload").
        what: &'static str,
        /// Requested `host:port`.
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Served directory is missing or not a directory.
    #[error("Served directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
