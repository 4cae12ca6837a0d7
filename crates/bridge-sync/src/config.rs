//! # Bridge Configuration
//!
//! Configuration management for the bridge service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BRIDGE_SERVER_PORT=3030                                            │
//! │     BRIDGE_OUTBOUND_URL=http://127.0.0.1:3100                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/canvas-bridge/bridge.toml (Linux)                        │
//! │     ~/Library/Application Support/io.canvasbridge.bridge/bridge.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     127.0.0.1:3030, auto-sync every 1500 ms                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # bridge.toml
//! [server]
//! enabled = true
//! host = "127.0.0.1"
//! port = 3030
//!
//! [sync]
//! auto_sync_enabled = true
//! interval_ms = 1500
//! suppression_window_ms = 1500
//! outbound_api_base_url = "http://127.0.0.1:3100"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BridgeError, BridgeResult};

// =============================================================================
// Server Settings
// =============================================================================

/// Settings for the REST + WebSocket protocol server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Whether the protocol server starts at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address for the protocol server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the protocol server (1..=65535).
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3030
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Settings for the outbound sync loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Whether the periodic canvas poll runs.
    #[serde(default = "default_true")]
    pub auto_sync_enabled: bool,

    /// Poll interval in milliseconds (positive).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Echo suppression window in milliseconds, on the order of one poll
    /// interval.
    #[serde(default = "default_suppression_ms")]
    pub suppression_window_ms: u64,

    /// Base URL of the remote store receiving the full-snapshot push.
    /// Absent means no outbound push.
    #[serde(default)]
    pub outbound_api_base_url: Option<String>,
}

fn default_interval_ms() -> u64 {
    1500
}

fn default_suppression_ms() -> u64 {
    1500
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            auto_sync_enabled: true,
            interval_ms: default_interval_ms(),
            suppression_window_ms: default_suppression_ms(),
            outbound_api_base_url: None,
        }
    }
}

impl SyncSettings {
    /// Poll interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Suppression window as a [`Duration`].
    pub fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression_window_ms)
    }
}

// =============================================================================
// Main Bridge Configuration
// =============================================================================

/// Complete bridge configuration.
///
/// ## Example Config File
/// ```toml
/// [server]
/// enabled = true
/// host = "127.0.0.1"
/// port = 3030
///
/// [sync]
/// auto_sync_enabled = true
/// interval_ms = 1500
/// outbound_api_base_url = "http://127.0.0.1:3100"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Protocol server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Sync loop settings.
    #[serde(default)]
    pub sync: SyncSettings,
}

impl BridgeConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (bridge.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> BridgeResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading bridge config from file");
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

    /// Loads the config or returns defaults if the load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load bridge config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves the configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> BridgeResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| BridgeError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Bridge config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(BridgeError::InvalidConfig(
                "server.host must not be empty".into(),
            ));
        }

        if self.server.port == 0 {
            return Err(BridgeError::InvalidConfig(
                "server.port must be in 1..=65535".into(),
            ));
        }

        if self.sync.interval_ms == 0 {
            return Err(BridgeError::InvalidConfig(
                "sync.interval_ms must be positive".into(),
            ));
        }

        if let Some(ref base) = self.sync.outbound_api_base_url {
            let parsed = url::Url::parse(base)?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(BridgeError::InvalidConfig(format!(
                    "outbound_api_base_url must be http(s), got: {}",
                    base
                )));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("BRIDGE_SERVER_ENABLED") {
            if let Ok(parsed) = enabled.parse::<bool>() {
                self.server.enabled = parsed;
            }
        }

        if let Ok(host) = std::env::var("BRIDGE_SERVER_HOST") {
            debug!(host = %host, "Overriding server host from environment");
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("BRIDGE_SERVER_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                debug!(port = p, "Overriding server port from environment");
                self.server.port = p;
            }
        }

        if let Ok(enabled) = std::env::var("BRIDGE_AUTO_SYNC") {
            if let Ok(parsed) = enabled.parse::<bool>() {
                self.sync.auto_sync_enabled = parsed;
            }
        }

        if let Ok(interval) = std::env::var("BRIDGE_SYNC_INTERVAL_MS") {
            if let Ok(ms) = interval.parse::<u64>() {
                self.sync.interval_ms = ms;
            }
        }

        if let Ok(url) = std::env::var("BRIDGE_OUTBOUND_URL") {
            debug!(url = %url, "Overriding outbound URL from environment");
            self.sync.outbound_api_base_url = Some(url);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "canvasbridge", "bridge")
            .map(|dirs| dirs.config_dir().join("bridge.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert!(config.server.enabled);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3030);
        assert!(config.sync.auto_sync_enabled);
        assert_eq!(config.sync.interval_ms, 1500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_address() {
        let config = BridgeConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3030");
    }

    #[test]
    fn test_validation_rejects_zero_port() {
        let mut config = BridgeConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let mut config = BridgeConfig::default();
        config.sync.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_of_outbound_url() {
        let mut config = BridgeConfig::default();
        config.sync.outbound_api_base_url = Some("http://127.0.0.1:3100".into());
        assert!(config.validate().is_ok());

        config.sync.outbound_api_base_url = Some("ftp://remote".into());
        assert!(config.validate().is_err());

        config.sync.outbound_api_base_url = Some("not a url".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BridgeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[sync]"));

        let parsed: BridgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: BridgeConfig = toml::from_str("[server]\nport = 4040\n").unwrap();
        assert_eq!(parsed.server.port, 4040);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.sync.interval_ms, 1500);
    }
}
