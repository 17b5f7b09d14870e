//! Directory watcher for live reload.
//!
//! Observes the served tree with `notify` and feeds every change to the
//! [`ChangeDebouncer`]. Events are delivered on notify's own thread.

use std::path::Path;

use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::debouncer::ChangeDebouncer;

/// Recursive watcher over the served directory.
pub struct DirectoryWatcher {
    watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Start watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the directory
    /// cannot be watched.
    pub fn start(root: &Path, debouncer: ChangeDebouncer) -> Result<Self, notify::Error> {
        let watched_root = root.to_path_buf();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => forward_event(&event, &watched_root, &debouncer),
                Err(e) => tracing::warn!(error = %e, "Watch error"),
            }
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::info!(path = %root.display(), "File watcher started");

        Ok(Self { watcher })
    }

    /// Stop watching. Events already in flight may still reach the debouncer.
    pub fn stop(self) {
        drop(self.watcher);
        tracing::debug!("File watcher stopped");
    }
}

/// Forward a raw notify event to the debouncer, one call per path.
///
/// Paths are made relative to `root` first, so exclusions only ever match
/// components inside the served tree.
fn forward_event(event: &Event, root: &Path, debouncer: &ChangeDebouncer) {
    if !is_change(event.kind) {
        return;
    }

    for path in &event.paths {
        let is_directory = is_directory_event(event.kind, path);
        let relative = path.strip_prefix(root).unwrap_or(path);
        debouncer.notify(relative, is_directory);
    }
}

/// Whether an event kind describes a create, modify, delete or rename.
fn is_change(kind: EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any => true,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Other => false,
    }
}

/// Whether the event concerns a directory.
///
/// Removed paths no longer exist, so only the event kind can tell.
fn is_directory_event(kind: EventKind, path: &Path) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
        EventKind::Remove(_) => false,
        _ => path.is_dir(),
    }
}
