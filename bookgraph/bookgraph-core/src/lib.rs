//! Core types and abstractions for the bookgraph data-access layer.
//!
//! This crate provides the entity model (users, books and the typed
//! relationships between them), identifiers, the shared error type,
//! configuration and logging setup used by the storage crate.

pub mod config;
pub mod error;
pub mod id;
pub mod logging;
pub mod types;

pub use config::BookgraphConfig;
pub use error::{BookgraphError, Result};
pub use id::{BookId, UserId};
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::BookgraphConfig;
    pub use crate::error::{BookgraphError, Result};
    pub use crate::id::{BookId, UserId};
    pub use crate::types::*;
}
