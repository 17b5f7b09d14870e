//! Event debouncing for live reload.
//!
//! Collapses bursts of filesystem events into a single reload trigger,
//! so an editor save that touches several files reloads the browser once.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Default quiet window before a reload fires.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(300);

/// Paths whose changes never trigger a reload.
///
/// A path is excluded when its extension is listed, or when any of its
/// components is a listed directory name. Paths are expected relative to the
/// served root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExcludePolicy {
    extensions: Vec<String>,
    dirs: Vec<String>,
}

impl ExcludePolicy {
    /// Create a policy from extension and directory name lists.
    ///
    /// Extensions may be given with or without a leading dot.
    #[must_use]
    pub fn new<E, D>(extensions: E, dirs: D) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.into().trim_start_matches('.').to_owned())
                .collect(),
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a path is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let excluded_ext = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));

        excluded_ext
            || path.components().any(|c| match c {
                Component::Normal(name) => self.dirs.iter().any(|d| OsStr::new(d) == name),
                _ => false,
            })
    }
}

/// Callback invoked once a burst of changes has settled.
type SettledCallback = Arc<dyn Fn() + Send + Sync>;

/// Pending timer waiting for the quiet window to elapse.
struct PendingTimer {
    generation: u64,
    task: JoinHandle<()>,
}

/// Timer slot guarded by the debouncer lock.
#[derive(Default)]
struct TimerState {
    next_generation: u64,
    pending: Option<PendingTimer>,
}

struct Inner {
    quiet_window: Duration,
    policy: ExcludePolicy,
    on_settled: SettledCallback,
    runtime: Handle,
    state: Mutex<TimerState>,
}

/// Thread-safe cancel-and-restart debouncer.
///
/// Every qualifying event replaces the pending timer, so the callback runs
/// exactly once, one quiet window after the last event of a burst.
/// Cloning yields another handle to the same timer.
#[derive(Clone)]
pub struct ChangeDebouncer {
    inner: Arc<Inner>,
}

impl ChangeDebouncer {
    /// Create a new debouncer.
    ///
    /// Timers run on the tokio runtime that is current at construction, so
    /// [`notify`](Self::notify) may be called from any thread afterwards.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new<F>(quiet_window: Duration, policy: ExcludePolicy, on_settled: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                quiet_window,
                policy,
                on_settled: Arc::new(on_settled),
                runtime: Handle::current(),
                state: Mutex::new(TimerState::default()),
            }),
        }
    }

    /// Record a raw filesystem event.
    ///
    /// Directory events and excluded paths are ignored. Anything else
    /// cancels the pending timer, if any, and arms a fresh one.
    pub fn notify(&self, path: &Path, is_directory: bool) {
        if is_directory || self.inner.policy.is_excluded(path) {
            tracing::trace!(path = %path.display(), is_directory, "Ignored filesystem event");
            return;
        }

        let mut state = self.lock_state();
        if let Some(previous) = state.pending.take() {
            previous.task.abort();
        }

        let generation = state.next_generation;
        state.next_generation = state.next_generation.wrapping_add(1);

        let inner = Arc::clone(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            tokio::time::sleep(inner.quiet_window).await;
            inner.fire(generation);
        });
        state.pending = Some(PendingTimer { generation, task });

        tracing::debug!(path = %path.display(), "Debounce timer armed");
    }

    /// Abandon the pending timer without invoking the callback.
    pub fn cancel(&self) {
        if let Some(pending) = self.lock_state().pending.take() {
            pending.task.abort();
        }
    }

    /// Whether a timer is currently armed.
    pub fn is_pending(&self) -> bool {
        self.lock_state().pending.is_some()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, TimerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Run the callback if `generation` is still the armed timer.
    fn fire(&self, generation: u64) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            // A newer event may have superseded us after the abort raced our wakeup
            if state.pending.as_ref().map(|p| p.generation) != Some(generation) {
                return;
            }
            state.pending = None;
        }

        (self.on_settled)();
    }
}

impl fmt::Debug for ChangeDebouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDebouncer")
            .field("quiet_window", &self.inner.quiet_window)
            .field("policy", &self.inner.policy)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}
