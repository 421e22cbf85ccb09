//! Read-through cache for single-user lookups.
//!
//! [`ReadThroughCache`] decorates any [`UserLookup`]: hits are served from an
//! LRU map, misses go to the inner lookup and successful results are stored.
//! Errors, `NotFound` included, are never cached.
//!
//! Every [`ReadThroughCache::invalidate`] bumps a generation counter. A miss
//! records the generation before calling the inner lookup and only stores its
//! result if no invalidation happened in between, so a lookup that raced an
//! update cannot put the pre-update user back.

use async_trait::async_trait;
use bookgraph_core::config::CacheConfig;
use bookgraph_core::error::Result;
use bookgraph_core::id::UserId;
use bookgraph_core::types::User;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Single-user lookup by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn lookup_user(&self, id: &UserId) -> Result<User>;
}

#[async_trait]
impl<T: UserLookup + ?Sized> UserLookup for Arc<T> {
    async fn lookup_user(&self, id: &UserId) -> Result<User> {
        (**self).lookup_user(id).await
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    /// Entries currently held
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct CacheEntry {
    user: User,
    inserted_at: Instant,
}

struct CacheState {
    entries: Option<LruCache<UserId, CacheEntry>>,
    generation: u64,
}

/// Read-through cache in front of a [`UserLookup`].
pub struct ReadThroughCache<L> {
    inner: L,
    state: Mutex<CacheState>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl<L: UserLookup> ReadThroughCache<L> {
    /// Build a cache over `inner`. A disabled cache, or one with zero
    /// capacity, passes every lookup through.
    pub fn new(inner: L, config: &CacheConfig) -> Self {
        let entries = if config.enabled {
            NonZeroUsize::new(config.max_entries).map(LruCache::new)
        } else {
            None
        };
        let ttl = (config.ttl_seconds > 0).then(|| Duration::from_secs(config.ttl_seconds));

        Self {
            inner,
            state: Mutex::new(CacheState {
                entries,
                generation: 0,
            }),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Return the cached user, or look it up and cache the result
    pub async fn get(&self, id: &UserId) -> Result<User> {
        let generation = {
            let mut state = self.state.lock();
            let ttl = self.ttl;
            let generation = state.generation;

            if let Some(entries) = state.entries.as_mut() {
                let cached = entries.get(id).map(|entry| {
                    let expired = ttl.is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl);
                    (expired, entry.user.clone())
                });

                match cached {
                    Some((false, user)) => {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        trace!(user_id = %id, "User cache hit");
                        return Ok(user);
                    }
                    Some((true, _)) => {
                        entries.pop(id);
                    }
                    None => {}
                }
            }
            generation
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(user_id = %id, "User cache miss");

        let user = self.inner.lookup_user(id).await?;

        let mut state = self.state.lock();
        if state.generation == generation {
            if let Some(entries) = state.entries.as_mut() {
                entries.put(
                    id.clone(),
                    CacheEntry {
                        user: user.clone(),
                        inserted_at: Instant::now(),
                    },
                );
            }
        } else {
            debug!(user_id = %id, "Invalidated during lookup, result not cached");
        }

        Ok(user)
    }

    /// Drop the entry for `id`. Lookups already in flight will not store
    /// their results.
    pub fn invalidate(&self, id: &UserId) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(entries) = state.entries.as_mut() {
            entries.pop(id);
        }
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!(user_id = %id, "User cache entry invalidated");
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(entries) = state.entries.as_mut() {
            entries.clear();
        }
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.state
            .lock()
            .entries
            .as_ref()
            .is_some_and(|entries| entries.contains(id))
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self
            .state
            .lock()
            .entries
            .as_ref()
            .map_or(0, |entries| entries.len());

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entries,
        }
    }
}

#[async_trait]
impl<L: UserLookup> UserLookup for ReadThroughCache<L> {
    async fn lookup_user(&self, id: &UserId) -> Result<User> {
        self.get(id).await
    }
}
