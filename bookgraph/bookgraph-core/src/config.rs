//! Configuration for the bookgraph data-access layer.
//!
//! Configuration is a TOML file with four sections:
//!
//! ```toml
//! [general]
//! version = "0.1.0"
//! log_level = "info"
//!
//! [database]
//! mode = "memory"          # memory | rocksdb | remote
//! path = ""                # rocksdb data directory
//! endpoint = ""            # remote endpoint, e.g. ws://127.0.0.1:8000
//! namespace = "bookgraph"
//! database = "main"
//! username = ""
//! password = ""
//!
//! [pool]
//! max_connections = 10
//! acquire_timeout_ms = 5000
//!
//! [cache]
//! enabled = true
//! max_entries = 10000
//! ttl_seconds = 0          # 0 = entries live until invalidated or evicted
//! ```
//!
//! The file location defaults to the platform config directory and can be
//! overridden with `BOOKGRAPH_CONFIG_PATH`. Individual values can be
//! overridden with the `BOOKGRAPH_*` variables below.

use crate::error::{BookgraphError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The current configuration version
pub const CONFIG_VERSION: &str = "0.1.0";

/// Environment variable prefix for all overrides
pub const ENV_PREFIX: &str = "BOOKGRAPH_";

// Environment variable names
pub const ENV_CONFIG_PATH: &str = "BOOKGRAPH_CONFIG_PATH";
pub const ENV_LOG_LEVEL: &str = "BOOKGRAPH_LOG_LEVEL";
pub const ENV_DB_MODE: &str = "BOOKGRAPH_DB_MODE";
pub const ENV_DB_PATH: &str = "BOOKGRAPH_DB_PATH";
pub const ENV_DB_ENDPOINT: &str = "BOOKGRAPH_DB_ENDPOINT";
pub const ENV_DB_NAMESPACE: &str = "BOOKGRAPH_DB_NAMESPACE";
pub const ENV_DB_DATABASE: &str = "BOOKGRAPH_DB_DATABASE";
pub const ENV_DB_USERNAME: &str = "BOOKGRAPH_DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "BOOKGRAPH_DB_PASSWORD";
pub const ENV_POOL_MAX_CONNECTIONS: &str = "BOOKGRAPH_POOL_MAX_CONNECTIONS";
pub const ENV_POOL_ACQUIRE_TIMEOUT_MS: &str = "BOOKGRAPH_POOL_ACQUIRE_TIMEOUT_MS";
pub const ENV_CACHE_ENABLED: &str = "BOOKGRAPH_CACHE_ENABLED";
pub const ENV_CACHE_MAX_ENTRIES: &str = "BOOKGRAPH_CACHE_MAX_ENTRIES";
pub const ENV_CACHE_TTL_SECONDS: &str = "BOOKGRAPH_CACHE_TTL_SECONDS";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_DB_MODES: [&str; 3] = ["memory", "rocksdb", "remote"];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookgraphConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Configuration version
    pub version: String,
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

/// Graph store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// memory, rocksdb or remote
    pub mode: String,
    /// Data directory for rocksdb mode
    #[serde(default)]
    pub path: String,
    /// Endpoint for remote mode
    #[serde(default)]
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    /// Empty means no authentication
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Connection pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of requests in flight against the store
    pub max_connections: u32,
    /// How long a request waits for a free connection, in milliseconds
    pub acquire_timeout_ms: u64,
}

/// User lookup cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Least recently used entries are evicted past this size
    pub max_entries: usize,
    /// Entry lifetime in seconds, 0 = no expiry
    #[serde(default)]
    pub ttl_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            mode: "memory".to_string(),
            path: String::new(),
            endpoint: String::new(),
            namespace: "bookgraph".to_string(),
            database: "main".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_ms: 5000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
            ttl_seconds: 0,
        }
    }
}

impl BookgraphConfig {
    /// Load configuration from the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path).await
    }

    /// Load configuration from the default location, falling back to
    /// defaults (plus environment overrides) when no file exists
    pub async fn load_or_default() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            return Self::load_from_path(&config_path).await;
        }

        debug!("No configuration at {}, using defaults", config_path.display());
        let mut config = Self::default();
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BookgraphError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&content)?;
        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text without applying overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BookgraphError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to a specific path atomically
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written
    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    BookgraphError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BookgraphError::Config(format!("Failed to serialize config: {}", e)))?;

        // Write to a sibling temp file, then rename over the target
        let temp_path = path.with_extension("toml.tmp");

        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| BookgraphError::Config(format!("Failed to write config file: {}", e)))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| BookgraphError::Config(format!("Failed to rename config file: {}", e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(BookgraphError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        let db = &self.database;
        if !VALID_DB_MODES.contains(&db.mode.as_str()) {
            return Err(BookgraphError::Config(format!(
                "Invalid database mode '{}'. Must be one of: {}",
                db.mode,
                VALID_DB_MODES.join(", ")
            )));
        }

        if db.mode == "rocksdb" && db.path.is_empty() {
            return Err(BookgraphError::config("A data path must be provided for rocksdb mode"));
        }

        if db.mode == "remote" && db.endpoint.is_empty() {
            return Err(BookgraphError::config("An endpoint must be provided for remote mode"));
        }

        if db.namespace.is_empty() {
            return Err(BookgraphError::config("Namespace cannot be empty"));
        }

        if db.database.is_empty() {
            return Err(BookgraphError::config("Database name cannot be empty"));
        }

        if db.username.is_empty() != db.password.is_empty() {
            return Err(BookgraphError::config(
                "username and password must be set together",
            ));
        }

        if self.pool.max_connections == 0 {
            return Err(BookgraphError::config("max_connections must be greater than 0"));
        }

        if self.pool.acquire_timeout_ms == 0 {
            return Err(BookgraphError::config("acquire_timeout_ms must be greater than 0"));
        }

        if self.cache.enabled && self.cache.max_entries == 0 {
            warn!("Cache max_entries is 0, user lookups will not be cached");
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Merge `BOOKGRAPH_*` environment variable overrides into the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn merge_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Merging {}* overrides", ENV_PREFIX);

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            debug!("Overriding log_level: {}", log_level);
            self.general.log_level = log_level;
        }

        if let Some(mode) = lookup(ENV_DB_MODE) {
            debug!("Overriding database mode: {}", mode);
            self.database.mode = mode;
        }

        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database.path = path;
        }

        if let Some(endpoint) = lookup(ENV_DB_ENDPOINT) {
            debug!("Overriding database endpoint");
            self.database.endpoint = endpoint;
        }

        if let Some(namespace) = lookup(ENV_DB_NAMESPACE) {
            self.database.namespace = namespace;
        }

        if let Some(database) = lookup(ENV_DB_DATABASE) {
            self.database.database = database;
        }

        if let Some(username) = lookup(ENV_DB_USERNAME) {
            debug!("Overriding database username");
            self.database.username = username;
        }

        if let Some(password) = lookup(ENV_DB_PASSWORD) {
            debug!("Overriding database password");
            self.database.password = password;
        }

        if let Some(max) = lookup(ENV_POOL_MAX_CONNECTIONS) {
            self.pool.max_connections = max.parse::<u32>().map_err(|e| {
                BookgraphError::Config(format!("Invalid {}: {}", ENV_POOL_MAX_CONNECTIONS, e))
            })?;
        }

        if let Some(timeout) = lookup(ENV_POOL_ACQUIRE_TIMEOUT_MS) {
            self.pool.acquire_timeout_ms = timeout.parse::<u64>().map_err(|e| {
                BookgraphError::Config(format!("Invalid {}: {}", ENV_POOL_ACQUIRE_TIMEOUT_MS, e))
            })?;
        }

        if let Some(enabled) = lookup(ENV_CACHE_ENABLED) {
            self.cache.enabled = enabled.parse::<bool>().map_err(|e| {
                BookgraphError::Config(format!("Invalid {}: {}", ENV_CACHE_ENABLED, e))
            })?;
        }

        if let Some(max_entries) = lookup(ENV_CACHE_MAX_ENTRIES) {
            self.cache.max_entries = max_entries.parse::<usize>().map_err(|e| {
                BookgraphError::Config(format!("Invalid {}: {}", ENV_CACHE_MAX_ENTRIES, e))
            })?;
        }

        if let Some(ttl) = lookup(ENV_CACHE_TTL_SECONDS) {
            self.cache.ttl_seconds = ttl.parse::<u64>().map_err(|e| {
                BookgraphError::Config(format!("Invalid {}: {}", ENV_CACHE_TTL_SECONDS, e))
            })?;
        }

        Ok(())
    }

    /// Get the configuration file path
    ///
    /// # Errors
    ///
    /// Returns an error if no platform config directory can be determined
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return Ok(PathBuf::from(config_path));
        }

        let dirs = ProjectDirs::from("", "", "bookgraph").ok_or_else(|| {
            BookgraphError::config("Could not determine the platform config directory")
        })?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
