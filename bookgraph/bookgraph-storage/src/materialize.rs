//! Conversion of raw store rows into domain objects.
//!
//! Rows are JSON property maps. A missing required property, a property of
//! the wrong type or an unparseable timestamp is a conversion failure; an
//! ownership status outside the allowed set is an integrity violation. A
//! list conversion fails as a whole when any single row fails.

use bookgraph_core::error::{BookgraphError, Result};
use bookgraph_core::id::{BookId, UserId};
use bookgraph_core::types::{
    Book, BookDetails, BorrowRelation, BorrowedBook, FollowingRelation, OwnedBook,
    OwnershipStatus, OwnsRelationship, User, UserProfile,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

pub type Properties = Map<String, Value>;

/// A traversal row: the far node and the edge that reached it.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphRow {
    pub node: Properties,
    pub edge: Properties,
}

impl GraphRow {
    pub fn from_value(row: Value) -> Result<Self> {
        serde_json::from_value(row)
            .map_err(|e| BookgraphError::conversion(format!("Malformed traversal row: {}", e)))
    }
}

/// Interpret a row as a property map
pub fn properties(row: Value) -> Result<Properties> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(BookgraphError::conversion(format!(
            "Expected a property map, got {}",
            other
        ))),
    }
}

pub fn required_str(props: &Properties, key: &str) -> Result<String> {
    match props.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(BookgraphError::conversion(format!(
            "Missing required property '{}'",
            key
        ))),
        Some(other) => Err(BookgraphError::conversion(format!(
            "Property '{}' should be a string, got {}",
            key, other
        ))),
    }
}

pub fn optional_str(props: &Properties, key: &str) -> Result<Option<String>> {
    match props.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(BookgraphError::conversion(format!(
            "Property '{}' should be a string, got {}",
            key, other
        ))),
    }
}

pub fn required_datetime(props: &Properties, key: &str) -> Result<DateTime<Utc>> {
    let raw = required_str(props, key)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            BookgraphError::conversion(format!("Property '{}' is not a timestamp: {}", key, e))
        })
}

pub fn user_from_node(props: &Properties) -> Result<User> {
    let profile = UserProfile {
        name: required_str(props, "name")?,
        email: required_str(props, "email")?,
        location: optional_str(props, "location")?,
        external_id: optional_str(props, "external_id")?,
    };
    Ok(User::new(UserId::from(required_str(props, "uid")?), profile))
}

pub fn book_from_node(props: &Properties) -> Result<Book> {
    let details = BookDetails {
        title: required_str(props, "title")?,
        author: required_str(props, "author")?,
        isbn: optional_str(props, "isbn")?,
    };
    Ok(Book::new(BookId::from(required_str(props, "bid")?), details))
}

pub fn owns_from_edge(props: &Properties) -> Result<OwnsRelationship> {
    let status: OwnershipStatus = required_str(props, "status")?.parse()?;
    Ok(OwnsRelationship {
        status,
        since: required_datetime(props, "since")?,
    })
}

pub fn borrow_from_edge(props: &Properties) -> Result<BorrowRelation> {
    Ok(BorrowRelation {
        owner_id: UserId::from(required_str(props, "owner_uid")?),
        borrowed_at: required_datetime(props, "borrowed_at")?,
    })
}

/// Row shape `{ follower, followee, created_at }`
pub fn following_from_row(props: &Properties) -> Result<FollowingRelation> {
    Ok(FollowingRelation {
        follower: UserId::from(required_str(props, "follower")?),
        followee: UserId::from(required_str(props, "followee")?),
        created_at: required_datetime(props, "created_at")?,
    })
}

pub fn users(rows: Vec<Value>) -> Result<Vec<User>> {
    rows.into_iter()
        .map(|row| user_from_node(&properties(row)?))
        .collect()
}

pub fn owned_books(rows: Vec<Value>) -> Result<Vec<OwnedBook>> {
    rows.into_iter()
        .map(|row| {
            let pair = GraphRow::from_value(row)?;
            Ok(OwnedBook::new(
                book_from_node(&pair.node)?,
                owns_from_edge(&pair.edge)?,
            ))
        })
        .collect()
}

pub fn borrowed_books(rows: Vec<Value>) -> Result<Vec<BorrowedBook>> {
    rows.into_iter()
        .map(|row| {
            let pair = GraphRow::from_value(row)?;
            Ok(BorrowedBook::new(
                book_from_node(&pair.node)?,
                borrow_from_edge(&pair.edge)?,
            ))
        })
        .collect()
}

/// Exactly one row is expected for a lookup by unique key
pub fn expect_single(mut rows: Vec<Value>, resource: &str, id: &str) -> Result<Value> {
    match rows.len() {
        0 => Err(BookgraphError::not_found(resource, id)),
        1 => Ok(rows.remove(0)),
        n => Err(BookgraphError::integrity(format!(
            "{} rows share the {} id '{}'",
            n, resource, id
        ))),
    }
}
