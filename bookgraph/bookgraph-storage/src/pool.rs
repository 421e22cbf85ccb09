//! Connection pooling for SurrealDB.
//!
//! The SurrealDB client multiplexes requests over one connection, so the pool
//! holds a single client and bounds the number of requests in flight with a
//! semaphore. A [`PooledConnection`] holds one permit and gives it back when
//! dropped, whichever way the request ends.

use crate::connection::ConnectionConfig;
use bookgraph_core::error::{BookgraphError, Result};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

/// A bounded pool of request slots over one SurrealDB client.
pub struct ConnectionPool {
    db: Surreal<Any>,
    semaphore: Arc<Semaphore>,
    max_size: usize,
    acquire_timeout: Duration,
    acquired: AtomicU64,
}

impl ConnectionPool {
    /// Connect to the configured database and build the pool
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let conn_str = config.connection_string()?;

        info!(
            "Connecting to SurrealDB at {} (pool size {})",
            conn_str, config.pool_size
        );

        let db = surrealdb::engine::any::connect(conn_str)
            .await
            .map_err(|e| BookgraphError::pool(format!("Failed to connect: {}", e)))?;

        // Authenticate before selecting a namespace
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(surrealdb::opt::auth::Root {
                username,
                password,
            })
            .await
            .map_err(|e| BookgraphError::pool(format!("Authentication failed: {}", e)))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                BookgraphError::pool(format!("Failed to use namespace/database: {}", e))
            })?;

        Ok(Self {
            db,
            semaphore: Arc::new(Semaphore::new(config.pool_size)),
            max_size: config.pool_size,
            acquire_timeout: config.acquire_timeout,
            acquired: AtomicU64::new(0),
        })
    }

    /// Acquire a connection for the duration of one request
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let permit = tokio::time::timeout(
            self.acquire_timeout,
            self.semaphore.clone().acquire_owned(),
        )
        .await
        .map_err(|_| {
            BookgraphError::pool(format!(
                "Timed out after {:?} waiting for a connection",
                self.acquire_timeout
            ))
        })?
        .map_err(|_| BookgraphError::pool("Connection pool is closed"))?;

        self.acquired.fetch_add(1, Ordering::Relaxed);
        debug!("Connection acquired ({} available)", self.available());

        Ok(PooledConnection {
            db: self.db.clone(),
            _permit: permit,
        })
    }

    /// Number of free request slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the maximum pool size
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Total number of successful acquisitions
    pub fn total_acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Stop handing out connections. Requests already running finish normally.
    pub fn close(&self) {
        info!("Closing connection pool");
        self.semaphore.close();
    }
}

/// A connection checked out of the pool.
pub struct PooledConnection {
    db: Surreal<Any>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}
