//! Notification hub for connected browser sessions.
//!
//! The active-session set is owned by a single actor task. Every operation
//! is a message on an unbounded channel, so any thread (including the
//! filesystem watcher thread) can register, remove or broadcast without
//! blocking and without touching the set directly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Per-session queue depth. A full queue already holds a pending reload.
const SESSION_QUEUE_CAPACITY: usize = 8;

/// Signal pushed to connected browsers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadSignal {
    /// Reload the whole page.
    Reload,
}

impl ReloadSignal {
    /// Wire representation of the signal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reload => "reload",
        }
    }
}

/// Opaque identifier of a connected session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commands processed by the hub actor.
enum HubCommand {
    Register {
        id: SessionId,
        sender: mpsc::Sender<ReloadSignal>,
    },
    Remove(SessionId),
    Broadcast,
    Count(oneshot::Sender<usize>),
    Shutdown,
}

/// Handle to the notification hub.
///
/// Cheap to clone; all clones talk to the same actor.
#[derive(Clone)]
pub struct NotificationHub {
    commands: mpsc::UnboundedSender<HubCommand>,
    next_id: Arc<AtomicU64>,
}

impl NotificationHub {
    /// Spawn the hub actor on the current tokio runtime.
    ///
    /// Returns the hub handle and the actor's join handle. The actor exits on
    /// [`shutdown`](Self::shutdown) or once every handle has been dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_actor(receiver));
        let hub = Self {
            commands,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (hub, task)
    }

    /// Register a new session.
    ///
    /// The returned [`Session`] receives every subsequent broadcast and
    /// deregisters itself when dropped.
    pub fn add_session(&self) -> Session {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        self.send(HubCommand::Register { id, sender });
        Session {
            id,
            receiver,
            hub: self.clone(),
        }
    }

    /// Deregister a session. Removing an absent session is a no-op.
    pub fn remove_session(&self, id: SessionId) {
        self.send(HubCommand::Remove(id));
    }

    /// Queue a reload signal for every active session.
    ///
    /// Returns immediately; delivery happens on the hub actor.
    pub fn broadcast(&self) {
        self.send(HubCommand::Broadcast);
    }

    /// Number of active sessions, as seen by the actor.
    ///
    /// Returns 0 once the hub has shut down.
    pub async fn session_count(&self) -> usize {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::Count(reply));
        response.await.unwrap_or(0)
    }

    /// Stop the actor and drop every session queue.
    pub fn shutdown(&self) {
        self.send(HubCommand::Shutdown);
    }

    fn send(&self, command: HubCommand) {
        // A closed channel means the hub is gone, so there is nothing to notify
        let _ = self.commands.send(command);
    }
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

/// Hub actor loop. Sole owner of the active-session set.
async fn run_actor(mut commands: mpsc::UnboundedReceiver<HubCommand>) {
    let mut sessions: HashMap<SessionId, mpsc::Sender<ReloadSignal>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register { id, sender } => {
                sessions.insert(id, sender);
                tracing::debug!(session = %id, active = sessions.len(), "Session connected");
            }
            HubCommand::Remove(id) => {
                if sessions.remove(&id).is_some() {
                    tracing::debug!(session = %id, active = sessions.len(), "Session closed");
                }
            }
            HubCommand::Broadcast => broadcast(&mut sessions),
            HubCommand::Count(reply) => {
                let _ = reply.send(sessions.len());
            }
            HubCommand::Shutdown => break,
        }
    }

    tracing::debug!(active = sessions.len(), "Notification hub stopped");
}

/// Deliver a reload signal to every session, dropping the ones that failed.
fn broadcast(sessions: &mut HashMap<SessionId, mpsc::Sender<ReloadSignal>>) {
    if sessions.is_empty() {
        tracing::debug!("Change detected, no connected browsers");
        return;
    }

    tracing::info!(sessions = sessions.len(), "Change detected. Triggering browser reload...");

    sessions.retain(|id, sender| match sender.try_send(ReloadSignal::Reload) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::debug!(session = %id, "Reload already queued");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::warn!(session = %id, "Failed to notify session, dropping it");
            false
        }
    });
}

/// A registered browser session.
///
/// Dropping the session removes it from the hub.
pub struct Session {
    id: SessionId,
    receiver: mpsc::Receiver<ReloadSignal>,
    hub: NotificationHub,
}

impl Session {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Wait for the next signal.
    ///
    /// Returns `None` once the hub has dropped this session or shut down.
    pub async fn recv(&mut self) -> Option<ReloadSignal> {
        self.receiver.recv().await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.hub.remove_session(self.id);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish_non_exhaustive()
    }
}
