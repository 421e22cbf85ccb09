//! Type definitions for the bookgraph system.
//!
//! Nodes (users, books), the typed relationships between them, and the
//! composite aggregates returned by relationship traversals.

pub mod book;
pub mod relation;
pub mod user;

pub use book::{Book, BookDetails};
pub use relation::{
    BorrowRelation, BorrowedBook, FollowingRelation, OwnedBook, OwnershipStatus,
    OwnsRelationship, RelationKind,
};
pub use user::{User, UserProfile};
