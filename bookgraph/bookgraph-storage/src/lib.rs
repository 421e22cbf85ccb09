//! Graph data-access layer for bookgraph, backed by SurrealDB.
//!
//! This crate provides connection pooling, the graph schema, query
//! construction, the store seam, row materialization, the read-through user
//! cache and the [`GraphRepository`] façade.

pub mod cache;
pub mod connection;
pub mod materialize;
pub mod pool;
pub mod queries;
pub mod query;
pub mod repository;
pub mod schema;
pub mod store;

pub use cache::{CacheStats, ReadThroughCache, UserLookup};
pub use connection::{ConnectionConfig, ConnectionMode};
pub use pool::{ConnectionPool, PooledConnection};
pub use queries::GraphQueries;
pub use query::{EdgeTraversal, GraphQuery, QueryBuilder};
pub use repository::GraphRepository;
pub use store::{GraphStore, SurrealGraphStore};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{CacheStats, ReadThroughCache, UserLookup};
    pub use crate::connection::{ConnectionConfig, ConnectionMode};
    pub use crate::pool::ConnectionPool;
    pub use crate::repository::GraphRepository;
    pub use crate::store::{GraphStore, SurrealGraphStore};
    pub use bookgraph_core::prelude::*;
}
