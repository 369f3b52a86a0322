//! Bridge configuration.
//!
//! The server block mirrors what the host's admin form stores: two API keys,
//! a node list and a connection timeout. Nothing is required at load time;
//! [`ServerAuth::from_config`] decides whether the configuration is complete
//! enough to talk to the engine.
//!
//! Config file resolution order:
//! 1. An explicit path (`--config`)
//! 2. `$SEARCHBRIDGE_CONFIG`
//! 3. `<config_dir>/searchbridge/config.toml`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV_VAR: &str = "SEARCHBRIDGE_CONFIG";

/// Project directory under the platform config dir.
pub const PROJECT_NAME: &str = "searchbridge";

/// Default connection timeout offered by a fresh config file.
pub const DEFAULT_CONNECTION_TIMEOUT_SECONDS: u64 = 2;

// ============================================================================
// Server
// ============================================================================

/// Transport protocol of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    #[default]
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// One engine node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Protocol.
    #[serde(default)]
    pub protocol: Protocol,
}

impl Node {
    /// Create a node.
    pub fn new(host: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
        }
    }

    /// Base URL, e.g. `https://search.example.com:443`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Stored server settings; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Search-only API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ro_api_key: Option<String>,
    /// Admin API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rw_api_key: Option<String>,
    /// Connection timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout_seconds: Option<u64>,
    /// Engine nodes, tried in order.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Which API key a group of operations uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Reads: listing, retrieval, health, debug, metrics.
    ReadOnly,
    /// Mutations: create, drop, index, delete.
    ReadWrite,
}

/// Complete credentials for one access mode.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerAuth {
    /// API key for the selected mode.
    pub api_key: String,
    /// Non-empty node list.
    pub nodes: Vec<Node>,
    /// Connection timeout.
    pub connection_timeout: Duration,
}

impl ServerAuth {
    /// Build credentials, or `None` unless key, nodes and timeout are all present.
    pub fn from_config(config: &ServerConfig, mode: AccessMode) -> Option<Self> {
        let key = match mode {
            AccessMode::ReadOnly => config.ro_api_key.as_deref(),
            AccessMode::ReadWrite => config.rw_api_key.as_deref(),
        }
        .map(str::trim)
        .filter(|k| !k.is_empty())?;

        let nodes: Vec<Node> = config
            .nodes
            .iter()
            .filter(|n| !n.host.trim().is_empty())
            .cloned()
            .collect();
        if nodes.is_empty() {
            return None;
        }

        let timeout = config.connection_timeout_seconds.filter(|t| *t > 0)?;

        Some(Self {
            api_key: key.to_string(),
            nodes,
            connection_timeout: Duration::from_secs(timeout),
        })
    }
}

impl fmt::Debug for ServerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerAuth")
            .field("api_key", &"<redacted>")
            .field("nodes", &self.nodes)
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}

// ============================================================================
// Sync
// ============================================================================

/// How an existing collection is checked against the desired schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftPolicy {
    /// Presence of the collection is enough.
    #[default]
    Presence,
    /// Field names and types must match, otherwise the collection is recreated.
    Strict,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Drift policy for existing collections.
    #[serde(default)]
    pub drift_policy: DriftPolicy,
}

// ============================================================================
// Top-level config
// ============================================================================

/// Complete bridge configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// JSON file with host index definitions, used by the CLI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes_path: Option<PathBuf>,
    /// Engine connection settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Reconciliation settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                ro_api_key: Some(String::new()),
                rw_api_key: Some(String::new()),
                connection_timeout_seconds: Some(DEFAULT_CONNECTION_TIMEOUT_SECONDS),
                nodes: vec![Node::new("localhost", 8108, Protocol::Https)],
            },
            sync: SyncConfig::default(),
            indexes_path: None,
        }
    }
}

impl BridgeConfig {
    /// Resolve the config file path from an explicit path, the environment or the default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
            && !path.is_empty()
        {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// `<config_dir>/searchbridge/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(PROJECT_NAME).join("config.toml"))
    }

    /// Load the resolved config file; a missing file yields an empty config.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                log::debug!("No config file at {}, using empty config", path.display());
                Ok(Self::empty())
            }
            None => Ok(Self::empty()),
        }
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::parse(e.to_string()))
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Config with nothing set.
    pub fn empty() -> Self {
        Self {
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            indexes_path: None,
        }
    }

    /// Write the default config file, refusing to overwrite unless `force`.
    pub fn init_file(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(Error::config(format!(
                "Config file already exists at {}. Use --force to overwrite.",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }

        let toml_str = Self::default().to_toml_string()?;
        std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
    }
}

// ============================================================================
// Tests
// ============================================================================
