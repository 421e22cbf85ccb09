//! Connection configuration for SurrealDB.

use bookgraph_core::config::BookgraphConfig;
use bookgraph_core::error::{BookgraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Connection mode for SurrealDB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionMode {
    /// In-memory database (for testing)
    Memory,
    /// RocksDB file storage, needs the `rocksdb` feature
    RocksDb { path: PathBuf },
    /// Remote server
    Remote { endpoint: String },
}

/// Configuration for the SurrealDB connection and its pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub mode: ConnectionMode,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pool_size: usize,
    pub acquire_timeout: Duration,
}

impl ConnectionConfig {
    /// Create a new in-memory configuration (for testing)
    pub fn memory() -> Self {
        Self::with_mode(ConnectionMode::Memory)
    }

    /// Create a new RocksDB configuration
    pub fn rocksdb(path: PathBuf) -> Self {
        Self::with_mode(ConnectionMode::RocksDb { path })
    }

    /// Create a new remote configuration
    pub fn remote(endpoint: String) -> Self {
        Self::with_mode(ConnectionMode::Remote { endpoint })
    }

    fn with_mode(mode: ConnectionMode) -> Self {
        Self {
            mode,
            namespace: "bookgraph".to_string(),
            database: "main".to_string(),
            username: None,
            password: None,
            pool_size: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Build from the `[database]` and `[pool]` sections of the configuration
    pub fn from_config(config: &BookgraphConfig) -> Result<Self> {
        let db = &config.database;
        let mode = match db.mode.as_str() {
            "memory" => ConnectionMode::Memory,
            "rocksdb" => ConnectionMode::RocksDb {
                path: PathBuf::from(&db.path),
            },
            "remote" => ConnectionMode::Remote {
                endpoint: db.endpoint.clone(),
            },
            other => {
                return Err(BookgraphError::config(format!(
                    "Unknown database mode '{}'",
                    other
                )));
            }
        };

        let mut connection = Self::with_mode(mode)
            .with_namespace(db.namespace.clone())
            .with_database(db.database.clone())
            .with_pool_size(config.pool.max_connections as usize)
            .with_acquire_timeout(Duration::from_millis(config.pool.acquire_timeout_ms));

        if !db.username.is_empty() {
            connection = connection.with_auth(db.username.clone(), db.password.clone());
        }

        connection.validate()?;
        Ok(connection)
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: String) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: String) -> Self {
        self.database = database;
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    /// Set the maximum number of concurrent requests
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set how long a request may wait for a free connection
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Get the connection string for SurrealDB
    pub fn connection_string(&self) -> Result<String> {
        match &self.mode {
            ConnectionMode::Memory => Ok("mem://".to_string()),
            ConnectionMode::RocksDb { path } => {
                let path_str = path
                    .to_str()
                    .ok_or_else(|| BookgraphError::config("Invalid path for RocksDB"))?;
                Ok(format!("rocksdb://{}", path_str))
            }
            ConnectionMode::Remote { endpoint } => Ok(endpoint.clone()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(BookgraphError::config("Namespace cannot be empty"));
        }
        if self.database.is_empty() {
            return Err(BookgraphError::config("Database name cannot be empty"));
        }
        if self.pool_size == 0 {
            return Err(BookgraphError::config("Pool size must be greater than 0"));
        }
        if self.acquire_timeout.is_zero() {
            return Err(BookgraphError::config("Acquire timeout must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::memory()
    }
}
