//! Configuration types for sync runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "GDRIVE_DL_CONFIG";

/// How a downloaded file is committed to its final name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitMode {
    /// Write to `<name>.part` and rename onto `<name>` once the stream ended.
    ///
    /// The final name existing means the file is complete, so failed items are
    /// picked up again by the next run.
    #[default]
    Atomic,
    /// Write straight to `<name>`.
    ///
    /// A file left behind by an exhausted transfer looks complete and is
    /// skipped by every later run.
    InPlace,
}

/// Configuration for listing and transfer operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Attempts per item before it is reported as failed.
    pub max_attempts: u32,
    /// Delay between two attempts of the same item, in milliseconds.
    pub retry_delay_ms: u64,
    /// Ceiling on any single network call, in milliseconds. Must be non-zero.
    pub network_timeout_ms: u64,
    /// Maximum number of items requested per listing page.
    pub page_size: u32,
    /// How finished downloads are committed.
    pub commit_mode: CommitMode,
    /// Whether to remove `.part` files once an item has exhausted its attempts.
    pub cleanup_on_error: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 3_000,
            network_timeout_ms: 60_000,
            page_size: 1000,
            commit_mode: CommitMode::Atomic,
            cleanup_on_error: true,
        }
    }
}

impl SyncConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay between attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Ceiling on a single network call.
    #[must_use]
    pub const fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Sets the number of attempts per item.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the network timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the listing page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the commit mode.
    #[must_use]
    pub const fn with_commit_mode(mut self, mode: CommitMode) -> Self {
        self.commit_mode = mode;
        self
    }

    /// Sets whether to clean up `.part` files after exhausted attempts.
    #[must_use]
    pub const fn with_cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.cleanup_on_error = cleanup;
        self
    }

    /// Checks values that would make every network call fail.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the network timeout is zero.
    pub fn validate(&self) -> crate::Result<()> {
        if self.network_timeout_ms == 0 {
            return Err(crate::Error::Config(
                "network_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Where credentials are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Authorized-user token file, relative to the working directory unless absolute.
    pub token_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listing and transfer settings.
    pub sync: SyncConfig,
    /// Credential settings.
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the config file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV).map_or_else(
            || {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("gdrive-dl")
                    .join("config.toml")
            },
            PathBuf::from,
        )
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::Error::Config(format!("{}: {e}", path.display())))?;
        if let Err(crate::Error::Config(msg)) = config.sync.validate() {
            return Err(crate::Error::Config(format!("{}: {msg}", path.display())));
        }
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::default_path())
    }
}
