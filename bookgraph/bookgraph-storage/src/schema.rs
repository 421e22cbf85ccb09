//! Graph schema: node tables, relation tables and their properties.

use bookgraph_core::error::{BookgraphError, Result};
use bookgraph_core::types::RelationKind;

/// Table holding user nodes
pub const USER_TABLE: &str = "users";
/// Table holding book nodes
pub const BOOK_TABLE: &str = "books";

/// Application id property of user nodes. The record id is store-internal.
pub const USER_KEY: &str = "uid";
/// Application id property of book nodes
pub const BOOK_KEY: &str = "bid";

pub const USER_FIELDS: &[&str] = &["uid", "name", "email", "location", "external_id"];
pub const BOOK_FIELDS: &[&str] = &["bid", "title", "author", "isbn"];
pub const FOLLOWING_FIELDS: &[&str] = &["created_at"];
pub const OWNS_FIELDS: &[&str] = &["status", "since"];
pub const BORROWED_FIELDS: &[&str] = &["owner_uid", "borrowed_at"];

/// Properties carried by edges of the given kind
pub fn edge_fields(kind: RelationKind) -> &'static [&'static str] {
    match kind {
        RelationKind::Following => FOLLOWING_FIELDS,
        RelationKind::Owns => OWNS_FIELDS,
        RelationKind::Borrowed => BORROWED_FIELDS,
    }
}

/// SurrealQL schema for the bookgraph store
pub const SCHEMA: &str = r#"
-- Nodes
DEFINE TABLE IF NOT EXISTS users SCHEMALESS;
DEFINE FIELD IF NOT EXISTS uid ON users TYPE string;
DEFINE FIELD IF NOT EXISTS name ON users TYPE string;
DEFINE FIELD IF NOT EXISTS email ON users TYPE string;

DEFINE INDEX IF NOT EXISTS users_uid ON users FIELDS uid UNIQUE;
DEFINE INDEX IF NOT EXISTS users_external_id ON users FIELDS external_id;

DEFINE TABLE IF NOT EXISTS books SCHEMALESS;
DEFINE FIELD IF NOT EXISTS bid ON books TYPE string;
DEFINE FIELD IF NOT EXISTS title ON books TYPE string;
DEFINE FIELD IF NOT EXISTS author ON books TYPE string;

DEFINE INDEX IF NOT EXISTS books_bid ON books FIELDS bid UNIQUE;

-- Relationships
DEFINE TABLE IF NOT EXISTS following SCHEMALESS TYPE RELATION IN users OUT users;
DEFINE FIELD IF NOT EXISTS created_at ON following TYPE string;

DEFINE TABLE IF NOT EXISTS owns SCHEMALESS TYPE RELATION IN users OUT books;
DEFINE FIELD IF NOT EXISTS status ON owns TYPE string ASSERT $value IN ['available', 'lent'];
DEFINE FIELD IF NOT EXISTS since ON owns TYPE string;

DEFINE TABLE IF NOT EXISTS borrowed SCHEMALESS TYPE RELATION IN users OUT books;
DEFINE FIELD IF NOT EXISTS owner_uid ON borrowed TYPE string;
DEFINE FIELD IF NOT EXISTS borrowed_at ON borrowed TYPE string;
"#;

/// Initialize the database schema. Safe to run more than once.
pub async fn init_schema(db: &surrealdb::Surreal<impl surrealdb::Connection>) -> Result<()> {
    tracing::info!("Initializing graph schema");

    db.query(SCHEMA)
        .await
        .and_then(|response| response.check())
        .map_err(|e| BookgraphError::store_write(format!("Failed to initialize schema: {}", e)))?;

    tracing::info!("Graph schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionConfig;
    use crate::pool::ConnectionPool;
    use crate::queries::RELATE_OWNS;

    #[test]
    fn test_edge_fields() {
        assert_eq!(edge_fields(RelationKind::Owns), &["status", "since"]);
        assert!(edge_fields(RelationKind::Following).contains(&"created_at"));
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = ConnectionPool::connect(ConnectionConfig::memory())
            .await
            .unwrap();
        let conn = pool.acquire().await.unwrap();

        init_schema(&*conn).await.unwrap();
        init_schema(&*conn).await.unwrap();
    }

    #[tokio::test]
    async fn test_owns_status_is_asserted() {
        let pool = ConnectionPool::connect(ConnectionConfig::memory())
            .await
            .unwrap();
        let conn = pool.acquire().await.unwrap();
        init_schema(&*conn).await.unwrap();

        let response = conn
            .query(
                "CREATE users:ann SET uid = 'ann', name = 'Ann', email = 'a@x';
                 CREATE books:dune SET bid = 'dune', title = 'Dune', author = 'Herbert';
                 RELATE users:ann->owns->books:dune SET status = 'stolen', since = '2024-01-01T00:00:00Z';",
            )
            .await
            .unwrap();
        assert!(response.check().is_err());
    }

    #[tokio::test]
    async fn test_owns_edges_match_on_user_property() {
        let pool = ConnectionPool::connect(ConnectionConfig::memory())
            .await
            .unwrap();
        let conn = pool.acquire().await.unwrap();
        init_schema(&*conn).await.unwrap();

        let relate = || {
            conn.query(RELATE_OWNS)
                .bind(("user_id", "ann"))
                .bind(("book_id", "dune"))
                .bind(("status", "available"))
                .bind(("since", "2024-01-01T00:00:00Z"))
        };

        conn.query(
            "CREATE users:ann SET uid = 'ann', name = 'Ann', email = 'a@x';
             CREATE books:dune SET bid = 'dune', title = 'Dune', author = 'Herbert';",
        )
        .await
        .unwrap()
        .check()
        .unwrap();
        relate().await.unwrap().check().unwrap();

        let mut response = conn
            .query("SELECT status, out.bid AS bid FROM owns WHERE in.uid = $uid AND status = 'available'")
            .bind(("uid", "ann"))
            .await
            .unwrap();
        let rows: Vec<serde_json::Value> = response.take(0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["bid"], "dune");

        assert!(relate().await.unwrap().check().is_err());
    }
}
