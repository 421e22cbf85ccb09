//! Identifier types for bookgraph entities.
//!
//! Ids are opaque string tokens. Fresh ids are UUIDv4 strings generated when
//! an entity is created; ids read back from the store are taken verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random id
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Get the id as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the id, returning the inner string
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a user node. Assigned once at creation, never reused.
    UserId
);

string_id!(
    /// Identifier of a book node.
    BookId
);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_differ() {
        let id1 = UserId::generate();
        let id2 = UserId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generated_id_is_uuid() {
        let id = BookId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = UserId::from("u-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"u-42\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_batch_generation_has_no_collisions() {
        let ids: HashSet<UserId> = (0..1_000).map(|_| UserId::generate()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    proptest! {
        #[test]
        fn test_display_is_verbatim(raw in "[a-zA-Z0-9:_-]{1,40}") {
            let id = UserId::from(raw.as_str());
            prop_assert_eq!(id.to_string(), raw);
        }
    }
}
