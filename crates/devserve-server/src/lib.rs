//! Development file server with live reload.
//!
//! This crate serves a directory over HTTP for frontend development:
//! - Static files with SPA fallback to `index.html`
//! - Cache-defeating headers on every response
//! - WebSocket channel that tells browsers to reload when files change
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use devserve_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         root_dir: PathBuf::from("dist"),
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = Server::bind(config).await.unwrap();
//!     server.run(async { tokio::signal::ctrl_c().await.unwrap() }).await;
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► content router (port)
//!    ▲                  └─► static files / index.html + bootstrap script
//!    │
//!    └──WebSocket── notify router (notify_port) ◄── NotificationHub actor
//!                                                        ▲ broadcast()
//! notify thread ──► DirectoryWatcher ──► ChangeDebouncer ┘
//! ```

mod app;
mod bootstrap;
mod error;
mod live_reload;
mod middleware;
mod state;
mod static_files;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use error::ServerError;
pub use live_reload::{
    ChangeDebouncer, DEFAULT_QUIET_WINDOW, DirectoryWatcher, ExcludePolicy, NotificationHub,
    ReloadSignal, Session, SessionId,
};
use state::AppState;

/// How long shutdown waits for background tasks before giving up on them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind both listeners to.
    pub host: String,
    /// HTTP port.
    pub port: u16,
    /// Live reload notification port.
    pub notify_port: u16,
    /// Directory to serve and watch.
    pub root_dir: PathBuf,
    /// Quiet window before a burst of changes triggers a reload.
    pub debounce: Duration,
    /// Paths whose changes never trigger a reload.
    pub exclude: ExcludePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 3000,
            notify_port: 3001,
            root_dir: PathBuf::from("."),
            debounce: DEFAULT_QUIET_WINDOW,
            exclude: ExcludePolicy::new(["rs"], [".git", ".hg", ".svn"]),
        }
    }
}

/// A bound, not yet running development server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    root: PathBuf,
    http_listener: TcpListener,
    notify_listener: TcpListener,
}

impl Server {
    /// Resolve the served directory and bind both listeners.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist or a port cannot be
    /// bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let root = tokio::fs::canonicalize(&config.root_dir)
            .await
            .map_err(|_| ServerError::RootNotFound(config.root_dir.clone()))?;
        if !tokio::fs::metadata(&root).await?.is_dir() {
            return Err(ServerError::RootNotFound(root));
        }

        let http_listener = bind_listener("HTTP", &config.host, config.port).await?;
        let notify_listener = bind_listener("live reload", &config.host, config.notify_port).await?;

        Ok(Self {
            config,
            root,
            http_listener,
            notify_listener,
        })
    }

    /// Canonical served directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Address of the HTTP listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn http_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.http_listener.local_addr()?)
    }

    /// Address of the live reload listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn notify_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.notify_listener.local_addr()?)
    }

    /// URL of the served site, using the configured host name.
    pub fn url(&self) -> String {
        let port = self
            .http_listener
            .local_addr()
            .map_or(self.config.port, |addr| addr.port());
        format!("http://{}:{port}", self.config.host)
    }

    /// Run until `shutdown` completes, then stop every component.
    ///
    /// A watcher setup failure is logged; the HTTP server keeps serving.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            config,
            root,
            http_listener,
            notify_listener,
        } = self;
        let token = CancellationToken::new();

        let (hub, hub_task) = NotificationHub::spawn();

        let notify_app = app::notify_router(hub.clone());
        let notify_task = spawn_serve("live reload", notify_listener, notify_app, token.clone());

        let state = Arc::new(AppState {
            root: root.clone(),
            bind_host: config.host.clone(),
            notify_port: config.notify_port,
        });
        let http_task = spawn_serve("HTTP", http_listener, app::create_router(state), token.clone());

        let broadcaster = hub.clone();
        let debouncer = ChangeDebouncer::new(config.debounce, config.exclude.clone(), move || {
            broadcaster.broadcast();
        });
        let watcher = match DirectoryWatcher::start(&root, debouncer.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::error!(path = %root.display(), error = %e, "Failed to start file watcher, live reload disabled");
                None
            }
        };

        shutdown.await;
        tracing::info!("Shutting down...");

        token.cancel();
        if let Some(watcher) = watcher {
            watcher.stop();
        }
        debouncer.cancel();
        hub.shutdown();

        let tasks = futures::future::join_all([http_task, notify_task, hub_task]);
        if tokio::time::timeout(SHUTDOWN_GRACE, tasks).await.is_err() {
            tracing::warn!(
                timeout_ms = SHUTDOWN_GRACE.as_millis(),
                "Shutdown timed out, some connections may still be open"
            );
        }

        tracing::info!("Shutdown complete");
    }
}

/// Bind a TCP listener, resolving host names such as `localhost`.
async fn bind_listener(what: &'static str, host: &str, port: u16) -> Result<TcpListener, ServerError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| ServerError::Bind {
            what,
            address: format!("{host}:{port}"),
            source,
        })
}

/// Serve `app` on `listener` until `token` is cancelled.
fn spawn_serve(
    what: &'static str,
    listener: TcpListener,
    app: axum::Router,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "{what} server started");
        }
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(token.cancelled_owned())
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "{what} server failed");
        }
    })
}

/// Wait for shutdown signal (Ctrl-C).
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
