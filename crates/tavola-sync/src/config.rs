//! # Sync Configuration
//!
//! Configuration for the draft synchronizer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TAVOLA_REMOTE_URL=https://orders.example.com/api                   │
//! │     TAVOLA_TERMINAL_ID=bar-2                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tavola-pos/sync.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tavola.pos/sync.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no remote (offline), platform data dir for the database            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [terminal]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Bar 2"
//!
//! [remote]
//! base_url = "https://orders.example.com/api"
//! token = "…"
//! timeout_secs = 10
//!
//! [storage]
//! database_path = "/var/lib/tavola/tavola.db"
//! key_prefix = "order_data_"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};
use tavola_core::SNAPSHOT_KEY_PREFIX;

// =============================================================================
// Terminal Configuration
// =============================================================================

/// Identity of this checkout terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Unique terminal identifier, sent with every remote request.
    /// Auto-generated on first run if not provided.
    pub id: String,

    /// Human-readable terminal name (e.g., "Bar 2", "Terrace").
    #[serde(default = "default_terminal_name")]
    pub name: String,
}

fn default_terminal_name() -> String {
    "Checkout".to_string()
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            id: Uuid::new_v4().to_string(),
            name: default_terminal_name(),
        }
    }
}

// =============================================================================
// Remote Settings
// =============================================================================

/// Where the remote order service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the order service. `None` runs the terminal offline:
    /// drafts stay local until a URL is configured.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the order service.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            base_url: None,
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Local snapshot store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file; defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Prefix in front of the order id in every snapshot key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_key_prefix() -> String {
    SNAPSHOT_KEY_PREFIX.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: None,
            key_prefix: default_key_prefix(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete synchronizer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl SyncConfig {
    /// Creates a new config with defaults and a generated terminal ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.terminal.id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("terminal.id must not be empty".into()));
        }

        if let Some(ref raw) = self.remote.base_url {
            let url = url::Url::parse(raw)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(SyncError::InvalidUrl(format!(
                    "Remote URL must start with http:// or https://, got: {}",
                    raw
                )));
            }
        }

        if self.remote.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.storage.key_prefix.is_empty() {
            return Err(SyncError::InvalidConfig("key_prefix must not be empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("TAVOLA_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal ID from environment");
            self.terminal.id = id;
        }

        if let Ok(name) = std::env::var("TAVOLA_TERMINAL_NAME") {
            self.terminal.name = name;
        }

        if let Ok(url) = std::env::var("TAVOLA_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            // Empty value switches the terminal to offline
            self.remote.base_url = Some(url).filter(|u| !u.is_empty());
        }

        if let Ok(token) = std::env::var("TAVOLA_REMOTE_TOKEN") {
            self.remote.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Ok(timeout) = std::env::var("TAVOLA_REMOTE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.remote.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric remote timeout"),
            }
        }

        if let Ok(path) = std::env::var("TAVOLA_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tavola", "pos")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Database file to open: the configured one, else the platform data dir,
    /// else `tavola.db` in the working directory.
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("com", "tavola", "pos")
                    .map(|dirs| dirs.data_dir().join("tavola.db"))
            })
            .unwrap_or_else(|| PathBuf::from("tavola.db"))
    }

    pub fn terminal_id(&self) -> &str {
        &self.terminal.id
    }

    /// Returns true if a remote order service is configured.
    pub fn is_remote_enabled(&self) -> bool {
        self.remote.base_url.is_some()
    }
}
