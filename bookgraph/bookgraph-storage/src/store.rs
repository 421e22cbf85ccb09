//! Graph store seam and its SurrealDB implementation.

use crate::pool::ConnectionPool;
use crate::query::GraphQuery;
use async_trait::async_trait;
use bookgraph_core::error::{BookgraphError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Executes parameterised graph queries and returns raw rows.
///
/// Each row is a property map; traversal queries return `{ node, edge }`
/// pairs. Failures are reported as [`BookgraphError::StoreRead`] for reads
/// and [`BookgraphError::StoreWrite`] for writes. Implementations must be
/// safe to share between tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a query that only reads
    async fn read(&self, query: &GraphQuery) -> Result<Vec<Value>>;

    /// Run a query that mutates the graph
    async fn write(&self, query: &GraphQuery) -> Result<Vec<Value>>;
}

#[async_trait]
impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    async fn read(&self, query: &GraphQuery) -> Result<Vec<Value>> {
        (**self).read(query).await
    }

    async fn write(&self, query: &GraphQuery) -> Result<Vec<Value>> {
        (**self).write(query).await
    }
}

/// Graph store backed by SurrealDB
pub struct SurrealGraphStore {
    pool: Arc<ConnectionPool>,
}

impl SurrealGraphStore {
    /// Create a new store over an existing pool
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Create a new store and initialize the schema
    pub async fn with_schema(pool: Arc<ConnectionPool>) -> Result<Self> {
        let conn = pool.acquire().await?;
        crate::schema::init_schema(&*conn).await?;
        drop(conn);
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    #[instrument(level = "debug", skip_all)]
    async fn execute(&self, query: &GraphQuery) -> std::result::Result<Vec<Value>, String> {
        let conn = self.pool.acquire().await.map_err(|e| e.to_string())?;

        trace!(query = query.text(), "Executing graph query");

        let mut response = conn
            .query(query.text())
            .bind(query.params().clone())
            .await
            .and_then(|response| response.check())
            .map_err(|e| e.to_string())?;

        let statements = response.num_statements();
        if statements == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<Value> = response
            .take(statements - 1)
            .map_err(|e| format!("Failed to decode rows: {}", e))?;

        debug!(rows = rows.len(), "Graph query returned");
        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for SurrealGraphStore {
    async fn read(&self, query: &GraphQuery) -> Result<Vec<Value>> {
        self.execute(query).await.map_err(BookgraphError::store_read)
    }

    async fn write(&self, query: &GraphQuery) -> Result<Vec<Value>> {
        self.execute(query).await.map_err(BookgraphError::store_write)
    }
}
