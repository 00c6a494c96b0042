//! Configuration system for fleetwatch
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (FLEETWATCH_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::peer::{PeerRegistry, RemovalPolicy};
use crate::scheduler::{RoundSettings, DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL};
use crate::types::PeerDescriptor;

/// Upper bound for any per-call timeout (ms)
const MAX_TIMEOUT_MS: u64 = 60_000;

/// Upper bound for history and task limits
const MAX_LIMIT: usize = 1000;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetwatchConfig {
    /// Round cadence, deadlines and limits
    pub aggregator: AggregatorSettings,

    /// Peers seeded into the registry at startup
    pub peers: Vec<PeerSeed>,

    /// Optional HTTP query surface
    pub api: ApiSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Aggregation round settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    /// Run rounds on a timer
    pub auto_refresh: bool,

    /// Auto-refresh interval in milliseconds
    pub interval_ms: u64,

    /// Health probe timeout in milliseconds
    pub probe_timeout_ms: u64,

    /// Exchange history timeout in milliseconds
    pub history_timeout_ms: u64,

    /// Task registry timeout in milliseconds
    pub task_timeout_ms: u64,

    /// Exchange records kept per peer
    pub history_limit: usize,

    /// Tasks requested from the primary peer
    pub task_limit: usize,

    /// Id of the peer hosting the task registry (unset = first peer)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_peer: Option<String>,

    /// Refuse runtime removal of peers listed in this file
    pub protect_seeded: bool,
}

/// A peer listed in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSeed {
    /// Local peer id
    pub id: String,

    /// Base URL
    pub address: String,

    /// Name shown while the peer is unreachable
    pub name: String,

    /// Domain shown while the peer is unreachable
    #[serde(default)]
    pub domain: String,
}

/// HTTP query surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Serve the query API while running
    pub enabled: bool,

    /// Listen address
    pub listen_addr: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for FleetwatchConfig {
    fn default() -> Self {
        Self {
            aggregator: AggregatorSettings::default(),
            peers: default_peers(),
            api: ApiSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            interval_ms: DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            probe_timeout_ms: 3000,
            history_timeout_ms: 3000,
            task_timeout_ms: 5000,
            history_limit: 20,
            task_limit: 50,
            primary_peer: None,
            protect_seeded: false,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1:8090".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

/// The three knowledge agents of a local deployment
fn default_peers() -> Vec<PeerSeed> {
    vec![
        PeerSeed {
            id: "alpha".to_string(),
            address: "http://localhost:8000".to_string(),
            name: "DKMES Alpha".to_string(),
            domain: "knowledge-management".to_string(),
        },
        PeerSeed {
            id: "beta".to_string(),
            address: "http://localhost:8001".to_string(),
            name: "AI/ML Research Agent".to_string(),
            domain: "artificial-intelligence".to_string(),
        },
        PeerSeed {
            id: "gamma".to_string(),
            address: "http://localhost:8002".to_string(),
            name: "CVDT Chatbot Agent".to_string(),
            domain: "data-analytics".to_string(),
        },
    ]
}

impl AggregatorSettings {
    /// Deadlines and limits for the scheduler
    pub fn round_settings(&self) -> RoundSettings {
        RoundSettings {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            history_timeout: Duration::from_millis(self.history_timeout_ms),
            task_timeout: Duration::from_millis(self.task_timeout_ms),
            history_limit: self.history_limit,
            task_limit: self.task_limit,
            primary_peer: self.primary_peer.clone(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn removal_policy(&self) -> RemovalPolicy {
        if self.protect_seeded {
            RemovalPolicy::ProtectSeeded
        } else {
            RemovalPolicy::AllowAll
        }
    }
}

impl PeerSeed {
    pub fn to_descriptor(&self) -> PeerDescriptor {
        PeerDescriptor::new(&self.address, &self.name, &self.domain).with_id(&self.id)
    }
}

impl FleetwatchConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|source| Error::IoRead {
                path: path.clone(),
                source,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", path.display(), e.message()),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::config_not_found(path));
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("fleetwatch.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("fleetwatch").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".fleetwatch").join("config.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/fleetwatch/config.toml"),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Aggregator settings
        if let Ok(val) = std::env::var("FLEETWATCH_AUTO_REFRESH") {
            self.aggregator.auto_refresh = parse_bool(&val);
        }
        if let Ok(val) = std::env::var("FLEETWATCH_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.aggregator.interval_ms = n;
            }
        }
        if let Ok(val) = std::env::var("FLEETWATCH_PROBE_TIMEOUT_MS") {
            if let Ok(n) = val.parse() {
                self.aggregator.probe_timeout_ms = n;
            }
        }
        if let Ok(val) = std::env::var("FLEETWATCH_HISTORY_TIMEOUT_MS") {
            if let Ok(n) = val.parse() {
                self.aggregator.history_timeout_ms = n;
            }
        }
        if let Ok(val) = std::env::var("FLEETWATCH_TASK_TIMEOUT_MS") {
            if let Ok(n) = val.parse() {
                self.aggregator.task_timeout_ms = n;
            }
        }
        if let Ok(val) = std::env::var("FLEETWATCH_HISTORY_LIMIT") {
            if let Ok(n) = val.parse() {
                self.aggregator.history_limit = n;
            }
        }
        if let Ok(val) = std::env::var("FLEETWATCH_TASK_LIMIT") {
            if let Ok(n) = val.parse() {
                self.aggregator.task_limit = n;
            }
        }
        if let Ok(val) = std::env::var("FLEETWATCH_PRIMARY_PEER") {
            self.aggregator.primary_peer = Some(val).filter(|v| !v.is_empty());
        }
        if let Ok(val) = std::env::var("FLEETWATCH_PROTECT_SEEDED") {
            self.aggregator.protect_seeded = parse_bool(&val);
        }

        // API settings
        if let Ok(val) = std::env::var("FLEETWATCH_API_ENABLED") {
            self.api.enabled = parse_bool(&val);
        }
        if let Ok(val) = std::env::var("FLEETWATCH_API_ADDR") {
            self.api.listen_addr = val;
        }

        // Logging settings
        if let Ok(val) = std::env::var("FLEETWATCH_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("FLEETWATCH_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("FLEETWATCH_LOG_JSON") {
            self.logging.json_format = parse_bool(&val);
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let agg = &self.aggregator;

        for (field, value) in [
            ("aggregator.probe_timeout_ms", agg.probe_timeout_ms),
            ("aggregator.history_timeout_ms", agg.history_timeout_ms),
            ("aggregator.task_timeout_ms", agg.task_timeout_ms),
        ] {
            if value == 0 || value > MAX_TIMEOUT_MS {
                return Err(Error::config_field_invalid(
                    field,
                    format!("{} must be between 1 and {} ms", field, MAX_TIMEOUT_MS),
                ));
            }
        }

        if agg.refresh_interval() < MIN_REFRESH_INTERVAL {
            return Err(Error::config_field_invalid(
                "aggregator.interval_ms",
                format!(
                    "interval_ms must be at least {} ms",
                    MIN_REFRESH_INTERVAL.as_millis()
                ),
            ));
        }

        for (field, value) in [
            ("aggregator.history_limit", agg.history_limit),
            ("aggregator.task_limit", agg.task_limit),
        ] {
            if value == 0 || value > MAX_LIMIT {
                return Err(Error::config_field_invalid(
                    field,
                    format!("{} must be between 1 and {}", field, MAX_LIMIT),
                ));
            }
        }

        // Seed peers go through the same checks as runtime additions
        self.build_registry()?;

        if let Some(ref primary) = agg.primary_peer {
            if !self.peers.iter().any(|p| p.id.trim() == primary.as_str()) {
                return Err(Error::config_field_invalid(
                    "aggregator.primary_peer",
                    format!("primary_peer '{}' does not name a configured peer", primary),
                ));
            }
        }

        if self.api.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(Error::config_field_invalid(
                "api.listen_addr",
                format!("'{}' is not a valid socket address", self.api.listen_addr),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Create a registry seeded with the configured peers
    pub fn build_registry(&self) -> Result<PeerRegistry> {
        let registry = PeerRegistry::new(self.aggregator.removal_policy());
        for (index, seed) in self.peers.iter().enumerate() {
            registry.seed(seed.to_descriptor()).map_err(|e| {
                Error::config_field_invalid(format!("peers[{}]", index), e.to_string())
            })?;
        }
        Ok(registry)
    }
}

fn parse_bool(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default location written by `config init`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("fleetwatch").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("fleetwatch.toml"))
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::IoWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|source| Error::IoWrite {
        path: config_path.clone(),
        source,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# fleetwatch configuration

[aggregator]
# Run aggregation rounds on a timer
auto_refresh = true

# Auto-refresh interval in milliseconds (minimum 100)
interval_ms = 5000

# Per-call deadlines in milliseconds
probe_timeout_ms = 3000
history_timeout_ms = 3000
task_timeout_ms = 5000

# Exchange records kept per peer; edges are judged on this window
history_limit = 20

# Tasks requested from the task registry
task_limit = 50

# Peer hosting the task registry (defaults to the first peer)
# primary_peer = "alpha"

# Refuse runtime removal of the peers listed below
protect_seeded = false

[[peers]]
id = "alpha"
address = "http://localhost:8000"
name = "DKMES Alpha"
domain = "knowledge-management"

[[peers]]
id = "beta"
address = "http://localhost:8001"
name = "AI/ML Research Agent"
domain = "artificial-intelligence"

[[peers]]
id = "gamma"
address = "http://localhost:8002"
name = "CVDT Chatbot Agent"
domain = "data-analytics"

[api]
# Serve the HTTP query API while running
enabled = false
listen_addr = "127.0.0.1:8090"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.fleetwatch/logs/fleetwatch.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
