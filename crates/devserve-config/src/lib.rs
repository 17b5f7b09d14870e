//! Configuration management for devserve.
//!
//! Parses `devserve.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `server.host` supports environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Port of the live reload notification channel.
///
/// Injected scripts connect to this port, so it is not user configurable.
pub const DEFAULT_NOTIFY_PORT: u16 = 3001;

/// Default quiet window before a burst of file changes triggers a reload.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override served directory.
    pub root_dir: Option<PathBuf>,
    /// Override browser launch flag.
    pub open_browser: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "devserve.toml";

/// Upper bound for `live_reload.debounce_ms`.
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Served directory (relative string from TOML).
    serve: ServeConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,
    /// Browser launch configuration.
    pub browser: BrowserConfig,

    /// Resolved served directory (set after loading).
    #[serde(skip)]
    pub root_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// HTTP port.
    pub port: u16,
    /// Notification (WebSocket) port.
    #[serde(skip)]
    pub notify_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 3000,
            notify_port: DEFAULT_NOTIFY_PORT,
        }
    }
}

/// Raw serve configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ServeConfigRaw {
    directory: Option<String>,
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Quiet window in milliseconds before a reload is broadcast.
    pub debounce_ms: u64,
    /// File extensions whose changes never trigger a reload.
    pub exclude_extensions: Vec<String>,
    /// Directory names whose contents never trigger a reload.
    pub exclude_dirs: Vec<String>,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            exclude_extensions: vec!["rs".to_owned()],
            exclude_dirs: vec![".git".to_owned(), ".hg".to_owned(), ".svn".to_owned()],
        }
    }
}

/// Browser launch configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Open the served URL in the default browser on startup.
    pub open: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self { open: true }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`DEV_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `devserve.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated after the overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir()?;
        Self::load_in(&cwd, config_path, cli_settings)
    }

    /// Load configuration as if started from `cwd`.
    fn load_in(
        cwd: &Path,
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path, cwd)?
        } else if let Some(discovered) = Self::discover_config(cwd) {
            Self::load_from_file(&discovered, cwd)?
        } else {
            Self::default_with_base(cwd)
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root_dir) = &settings.root_dir {
            self.root_dir.clone_from(root_dir);
        }
        if let Some(open_browser) = settings.open_browser {
            self.browser.open = open_browser;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config serving the given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            serve: ServeConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            browser: BrowserConfig::default(),
            root_dir: base.to_path_buf(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    ///
    /// Without `[serve] directory` the served directory is `cwd`, wherever
    /// the file was found.
    fn load_from_file(path: &Path, cwd: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir, cwd);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_live_reload()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        if self.server.port == self.server.notify_port {
            return Err(ConfigError::Validation(format!(
                "server.port cannot be {}, it is reserved for live reload",
                self.server.notify_port
            )));
        }

        Ok(())
    }

    /// Validate live reload configuration.
    fn validate_live_reload(&self) -> Result<(), ConfigError> {
        let debounce_ms = self.live_reload.debounce_ms;
        if debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "live_reload.debounce_ms must be greater than 0".to_owned(),
            ));
        }
        if debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "live_reload.debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        Ok(())
    }

    /// Resolve the served directory relative to the config directory.
    fn resolve_paths(&mut self, config_dir: &Path, cwd: &Path) {
        self.root_dir = match &self.serve.directory {
            Some(directory) => config_dir.join(directory),
            None => cwd.to_path_buf(),
        };
    }
}
