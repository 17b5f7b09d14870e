//! Application state.
//!
//! Shared, immutable state for content request handlers.

use std::path::PathBuf;

/// Application state shared across all content handlers.
#[derive(Debug)]
pub(crate) struct AppState {
    /// Canonical served directory.
    pub(crate) root: PathBuf,
    /// Host the server was bound to, used when a request has no `Host` header.
    pub(crate) bind_host: String,
    /// Port of the live reload notification channel.
    pub(crate) notify_port: u16,
}

impl AppState {
    /// Path of the root index document.
    #[must_use]
    pub(crate) fn index_path(&self) -> PathBuf {
        self.root.join(crate::static_files::INDEX_DOCUMENT)
    }
}
