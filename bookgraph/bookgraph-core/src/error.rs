//! Error types for the bookgraph system.

/// Result type alias for bookgraph operations.
pub type Result<T> = std::result::Result<T, BookgraphError>;

/// Main error type for the bookgraph system.
#[derive(Debug, thiserror::Error)]
pub enum BookgraphError {
    /// A single-entity lookup matched zero rows
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// A unique lookup matched several rows, or a property held a value
    /// outside its enumerated domain
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// A store row lacked a required property or had the wrong type
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// The store failed or rejected a read query
    #[error("Store read error: {0}")]
    StoreRead(String),

    /// The store failed or rejected a write query
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// Connection pool errors
    #[error("Pool error: {0}")]
    Pool(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookgraphError {
    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a new integrity violation error
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityViolation(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Create a new store read error
    pub fn store_read(msg: impl Into<String>) -> Self {
        Self::StoreRead(msg.into())
    }

    /// Create a new store write error
    pub fn store_write(msg: impl Into<String>) -> Self {
        Self::StoreWrite(msg.into())
    }

    /// Create a new pool error
    pub fn pool(msg: impl Into<String>) -> Self {
        Self::Pool(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an integrity violation
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::IntegrityViolation(_))
    }

    /// Check if this is a conversion error
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion(_))
    }

    /// Check if the store itself failed, on either the read or write path
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreRead(_) | Self::StoreWrite(_))
    }
}
