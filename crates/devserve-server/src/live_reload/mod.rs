//! Live reload system.
//!
//! Filesystem changes flow from [`DirectoryWatcher`] through the
//! [`ChangeDebouncer`] into the [`NotificationHub`], which pushes a
//! `reload` message to every connected browser.

mod debouncer;
mod hub;
mod watcher;
mod websocket;

pub use debouncer::{ChangeDebouncer, DEFAULT_QUIET_WINDOW, ExcludePolicy};
pub use hub::{NotificationHub, ReloadSignal, Session, SessionId};
pub use watcher::DirectoryWatcher;
pub(crate) use websocket::ws_handler;
