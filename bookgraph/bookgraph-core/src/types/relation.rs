//! Typed relationships between nodes and the aggregates built from them.

use crate::error::{BookgraphError, Result};
use crate::id::UserId;
use crate::types::book::Book;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of directed relationship stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// User → User
    Following,
    /// User → Book, carries an [`OwnershipStatus`]
    Owns,
    /// User → Book, an active borrow of someone else's copy
    Borrowed,
}

impl RelationKind {
    /// Name of the relation table holding edges of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Following => "following",
            Self::Owns => "owns",
            Self::Borrowed => "borrowed",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circulation status of an owned copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipStatus {
    Available,
    Lent,
}

impl OwnershipStatus {
    pub const ALL: [Self; 2] = [Self::Available, Self::Lent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Lent => "lent",
        }
    }
}

impl std::str::FromStr for OwnershipStatus {
    type Err = BookgraphError;

    /// Parsing is exact: stored statuses are written by this crate in
    /// lowercase, so anything else is corrupt data.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(Self::Available),
            "lent" => Ok(Self::Lent),
            _ => Err(BookgraphError::IntegrityViolation(format!(
                "Invalid ownership status '{}'. Must be one of: available, lent",
                s
            ))),
        }
    }
}

impl std::fmt::Display for OwnershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Following edge. Following is one-directional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowingRelation {
    pub follower: UserId,
    pub followee: UserId,
    pub created_at: DateTime<Utc>,
}

/// Properties of an Owns edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnsRelationship {
    pub status: OwnershipStatus,
    /// When the user acquired the book
    pub since: DateTime<Utc>,
}

/// Properties of a Borrowed edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRelation {
    /// The user whose copy is being borrowed
    pub owner_id: UserId,
    pub borrowed_at: DateTime<Utc>,
}

/// A book together with the Owns edge that reached it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedBook {
    pub book: Book,
    pub relation: OwnsRelationship,
}

impl OwnedBook {
    pub fn new(book: Book, relation: OwnsRelationship) -> Self {
        Self { book, relation }
    }

    pub fn status(&self) -> OwnershipStatus {
        self.relation.status
    }
}

/// A book together with the Borrowed edge that reached it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedBook {
    pub book: Book,
    pub relation: BorrowRelation,
}

impl BorrowedBook {
    pub fn new(book: Book, relation: BorrowRelation) -> Self {
        Self { book, relation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_roundtrip_through_str() {
        for status in OwnershipStatus::ALL {
            assert_eq!(status.as_str().parse::<OwnershipStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_other_casing() {
        let err = "Available".parse::<OwnershipStatus>().unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&OwnershipStatus::Lent).unwrap();
        assert_eq!(json, "\"lent\"");
    }

    #[test]
    fn test_relation_tables() {
        assert_eq!(RelationKind::Following.as_str(), "following");
        assert_eq!(RelationKind::Owns.as_str(), "owns");
        assert_eq!(RelationKind::Borrowed.to_string(), "borrowed");
    }

    proptest! {
        #[test]
        fn test_status_accepts_exactly_two_values(raw in "\\PC{0,12}") {
            let parsed = raw.parse::<OwnershipStatus>();
            let expected = raw == "available" || raw == "lent";
            prop_assert_eq!(parsed.is_ok(), expected);
        }
    }
}
