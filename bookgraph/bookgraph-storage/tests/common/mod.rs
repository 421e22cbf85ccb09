//! Shared helpers for the storage integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bookgraph_core::config::CacheConfig;
use bookgraph_core::error::Result;
use bookgraph_core::types::{Book, BookDetails, User, UserProfile};
use bookgraph_storage::prelude::*;
use bookgraph_storage::GraphQuery;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Store wrapper that counts the requests reaching the real store
pub struct CountingStore<S> {
    inner: S,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: GraphStore> GraphStore for CountingStore<S> {
    async fn read(&self, query: &GraphQuery) -> Result<Vec<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(query).await
    }

    async fn write(&self, query: &GraphQuery) -> Result<Vec<Value>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(query).await
    }
}

pub fn cache_config() -> CacheConfig {
    CacheConfig {
        enabled: true,
        max_entries: 1024,
        ttl_seconds: 0,
    }
}

/// A fresh in-memory store with the schema applied
pub async fn memory_store(pool_size: usize) -> SurrealGraphStore {
    let pool = ConnectionPool::connect(ConnectionConfig::memory().with_pool_size(pool_size))
        .await
        .expect("in-memory pool");
    SurrealGraphStore::with_schema(Arc::new(pool))
        .await
        .expect("schema")
}

pub async fn memory_repository() -> GraphRepository<SurrealGraphStore> {
    GraphRepository::new(memory_store(8).await, &cache_config())
}

/// Repository whose store requests are counted through the returned handle
pub async fn counting_repository() -> (
    GraphRepository<Arc<CountingStore<SurrealGraphStore>>>,
    Arc<CountingStore<SurrealGraphStore>>,
) {
    let store = Arc::new(CountingStore::new(memory_store(8).await));
    (GraphRepository::new(store.clone(), &cache_config()), store)
}

pub async fn create_user<S: GraphStore>(repo: &GraphRepository<S>, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase());
    repo.create_user(UserProfile::new(name, email))
        .await
        .expect("create user")
}

pub async fn create_book<S: GraphStore>(repo: &GraphRepository<S>, title: &str) -> Book {
    repo.create_book(BookDetails::new(title, "Some Author"))
        .await
        .expect("create book")
}
