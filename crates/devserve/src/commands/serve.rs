//! `serve` command implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use devserve_config::{CliSettings, Config};
use devserve_server::{ExcludePolicy, Server, ServerConfig, shutdown_signal};

use crate::error::CliError;
use crate::output::Output;

/// Document whose absence triggers the startup warning.
const INDEX_DOCUMENT: &str = "index.html";

/// Pause after the missing index warning so it is not scrolled away.
const MISSING_INDEX_PAUSE: Duration = Duration::from_secs(3);

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Directory to serve (default: current directory).
    directory: Option<PathBuf>,

    /// HTTP port (default: 3000).
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (default: localhost).
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Path to configuration file (default: auto-discover devserve.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not open the browser on startup.
    #[arg(long)]
    no_open: bool,

    /// Enable verbose output (debug logging).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            root_dir: self.directory,
            open_browser: self.no_open.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::debug!(path = %path.display(), "Loaded configuration");
        }

        let root = resolve_root(&config.root_dir)?;
        if !root.join(INDEX_DOCUMENT).is_file() {
            warn_missing_index(&root);
            tokio::time::sleep(MISSING_INDEX_PAUSE).await;
        }

        let server_config = ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
            notify_port: config.server.notify_port,
            root_dir: root,
            debounce: Duration::from_millis(config.live_reload.debounce_ms),
            exclude: ExcludePolicy::new(
                &config.live_reload.exclude_extensions,
                &config.live_reload.exclude_dirs,
            ),
        };
        let server = Server::bind(server_config).await?;

        let url = server.url();
        output.banner(&url, &server.root().display().to_string());

        if config.browser.open {
            open_browser(&output, &url);
        }

        server.run(shutdown_signal()).await;
        output.success("Shutdown complete. Goodbye!");

        Ok(())
    }
}

/// Resolve the served directory to an absolute path.
fn resolve_root(dir: &Path) -> Result<PathBuf, CliError> {
    let root = dir
        .canonicalize()
        .map_err(|_| CliError::Validation(format!("Directory not found: {}", dir.display())))?;
    if !root.is_dir() {
        return Err(CliError::Validation(format!(
            "Not a directory: {}",
            root.display()
        )));
    }
    Ok(root)
}

/// Log that the served directory has no index document.
fn warn_missing_index(root: &Path) {
    tracing::warn!(path = %root.display(), "'{INDEX_DOCUMENT}' not found in served directory");
    if needs_build_dir_hint(root) {
        tracing::warn!("Are you running this from your project's 'dist' or 'build' folder?");
    }
}

/// Whether the served path looks like a source tree rather than build output.
fn needs_build_dir_hint(root: &Path) -> bool {
    let lowered = root.to_string_lossy().to_lowercase();
    !lowered.contains("dist") && !lowered.contains("build")
}

/// Open `url` in the default browser; failures are reported, not fatal.
fn open_browser(output: &Output, url: &str) {
    if let Err(e) = webbrowser::open(url) {
        tracing::debug!(error = %e, "Browser launch failed");
        output.warning(&format!("Could not open browser, visit {url} manually"));
    }
}
