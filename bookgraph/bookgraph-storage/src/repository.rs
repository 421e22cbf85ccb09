//! Repository façade consumed by the API layer.
//!
//! Lookups by user id go through the read-through cache; everything else
//! goes straight to the query layer. An `update_user` the store committed
//! invalidates the cached copy before it returns, even if the echoed row
//! then fails to convert; a rejected one leaves the cache alone.

use crate::cache::{CacheStats, ReadThroughCache};
use crate::connection::ConnectionConfig;
use crate::pool::ConnectionPool;
use crate::queries::{updated_user, GraphQueries};
use crate::store::{GraphStore, SurrealGraphStore};
use bookgraph_core::config::{BookgraphConfig, CacheConfig};
use bookgraph_core::error::Result;
use bookgraph_core::id::{BookId, UserId};
use bookgraph_core::types::{
    Book, BookDetails, BorrowedBook, FollowingRelation, OwnedBook, OwnershipStatus, User,
    UserProfile,
};
use std::sync::Arc;
use tracing::info;

/// Public data-access contract for users, books and their relationships.
///
/// Create one at startup and share it behind an `Arc`; the cache inside is
/// synchronised internally.
pub struct GraphRepository<S> {
    queries: Arc<GraphQueries<S>>,
    cache: ReadThroughCache<Arc<GraphQueries<S>>>,
}

impl GraphRepository<SurrealGraphStore> {
    /// Connect to the configured database, initialize the schema and build
    /// the cache.
    pub async fn connect(config: &BookgraphConfig) -> Result<Self> {
        config.validate()?;
        let connection = ConnectionConfig::from_config(config)?;
        let pool = Arc::new(ConnectionPool::connect(connection).await?);
        let store = SurrealGraphStore::with_schema(pool).await?;

        info!(
            cache_enabled = config.cache.enabled,
            cache_entries = config.cache.max_entries,
            "Graph repository ready"
        );
        Ok(Self::new(store, &config.cache))
    }
}

impl<S: GraphStore> GraphRepository<S> {
    pub fn new(store: S, cache: &CacheConfig) -> Self {
        let queries = Arc::new(GraphQueries::new(store));
        let cache = ReadThroughCache::new(queries.clone(), cache);
        Self { queries, cache }
    }

    /// Uncached query layer
    pub fn queries(&self) -> &GraphQueries<S> {
        &self.queries
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn create_user(&self, profile: UserProfile) -> Result<User> {
        self.queries.create_user(profile).await
    }

    /// Cached lookup by id
    pub async fn get_user_by_id(&self, id: &UserId) -> Result<User> {
        self.cache.get(id).await
    }

    pub async fn get_user_by_external_id(&self, external_id: &str) -> Result<User> {
        self.queries.get_user_by_external_id(external_id).await
    }

    /// Invalidation happens as soon as the store has committed the change,
    /// before the echoed row is converted.
    pub async fn update_user(&self, id: &UserId, profile: UserProfile) -> Result<User> {
        let rows = self.queries.write_user_update(id, profile).await?;
        if !rows.is_empty() {
            self.cache.invalidate(id);
        }
        updated_user(rows, id)
    }

    pub async fn create_following_relation(
        &self,
        follower: &User,
        followee: &User,
    ) -> Result<FollowingRelation> {
        self.queries
            .create_following_relation(follower.id(), followee.id())
            .await
    }

    pub async fn is_following(&self, follower: &User, followee: &User) -> Result<bool> {
        self.queries.is_following(follower.id(), followee.id()).await
    }

    pub async fn get_followers(&self, user: &User) -> Result<Vec<User>> {
        self.queries.get_followers(user.id()).await
    }

    pub async fn get_following(&self, user: &User) -> Result<Vec<User>> {
        self.queries.get_following(user.id()).await
    }

    pub async fn create_book(&self, details: BookDetails) -> Result<Book> {
        self.queries.create_book(details).await
    }

    pub async fn get_book_by_id(&self, id: &BookId) -> Result<Book> {
        self.queries.get_book_by_id(id).await
    }

    pub async fn get_owned_books(&self, user_id: &UserId) -> Result<Vec<OwnedBook>> {
        self.queries.get_owned_books(user_id).await
    }

    pub async fn get_available_books(&self, user_id: &UserId) -> Result<Vec<OwnedBook>> {
        self.queries.get_available_books(user_id).await
    }

    pub async fn get_lent_books(&self, user_id: &UserId) -> Result<Vec<OwnedBook>> {
        self.queries.get_lent_books(user_id).await
    }

    pub async fn get_borrowed_books(&self, user_id: &UserId) -> Result<Vec<BorrowedBook>> {
        self.queries.get_borrowed_books(user_id).await
    }

    pub async fn add_owned_book(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        status: OwnershipStatus,
    ) -> Result<OwnedBook> {
        self.queries.add_owned_book(user_id, book_id, status).await
    }

    pub async fn update_ownership_status(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        status: OwnershipStatus,
    ) -> Result<OwnedBook> {
        self.queries
            .update_ownership_status(user_id, book_id, status)
            .await
    }

    pub async fn add_borrowed_book(
        &self,
        borrower: &UserId,
        book_id: &BookId,
        owner: &UserId,
    ) -> Result<BorrowedBook> {
        self.queries.add_borrowed_book(borrower, book_id, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockGraphStore;
    use bookgraph_core::error::BookgraphError;
    use serde_json::json;

    fn cache_config() -> CacheConfig {
        CacheConfig {
            enabled: true,
            max_entries: 16,
            ttl_seconds: 0,
        }
    }

    fn user_row(name: &str) -> serde_json::Value {
        json!({ "uid": "u1", "name": name, "email": "ann@example.com" })
    }

    #[tokio::test]
    async fn test_failed_update_keeps_cached_user() {
        let mut store = MockGraphStore::new();
        store
            .expect_read()
            .times(1)
            .returning(|_| Ok(vec![user_row("Ann")]));
        store
            .expect_write()
            .times(1)
            .returning(|_| Err(BookgraphError::store_write("write refused")));

        let repo = GraphRepository::new(store, &cache_config());
        let id = UserId::from("u1");

        repo.get_user_by_id(&id).await.unwrap();
        let err = repo
            .update_user(&id, UserProfile::new("Annie", "ann@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookgraphError::StoreWrite(_)));

        assert_eq!(repo.get_user_by_id(&id).await.unwrap().name(), "Ann");
        assert_eq!(repo.cache_stats().invalidations, 0);
    }

    #[tokio::test]
    async fn test_successful_update_invalidates() {
        let mut store = MockGraphStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_read()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![user_row("Ann")]));
        store
            .expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![user_row("Annie")]));
        store
            .expect_read()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![user_row("Annie")]));

        let repo = GraphRepository::new(store, &cache_config());
        let id = UserId::from("u1");

        assert_eq!(repo.get_user_by_id(&id).await.unwrap().name(), "Ann");
        repo.update_user(&id, UserProfile::new("Annie", "ann@example.com"))
            .await
            .unwrap();
        assert_eq!(repo.get_user_by_id(&id).await.unwrap().name(), "Annie");
    }

    #[tokio::test]
    async fn test_committed_update_invalidates_even_if_conversion_fails() {
        let mut store = MockGraphStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_read()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![user_row("Ann")]));
        store
            .expect_write()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![json!({
                    "uid": "u1",
                    "name": "Annie",
                    "email": "ann@example.com",
                    "location": 5
                })])
            });
        store
            .expect_read()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![user_row("Annie")]));

        let repo = GraphRepository::new(store, &cache_config());
        let id = UserId::from("u1");

        assert_eq!(repo.get_user_by_id(&id).await.unwrap().name(), "Ann");
        let err = repo
            .update_user(&id, UserProfile::new("Annie", "ann@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_conversion());

        assert_eq!(repo.cache_stats().invalidations, 1);
        assert_eq!(repo.get_user_by_id(&id).await.unwrap().name(), "Annie");
    }
}
