//! User nodes.

use crate::id::UserId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Mutable attributes of a user.
///
/// An update overwrites all of these at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub location: Option<String>,
    /// Third-party identity (e.g. a Facebook id) used for cross-system lookup
    pub external_id: Option<String>,
}

impl UserProfile {
    /// Create a profile with the required attributes
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            location: None,
            external_id: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the external identity reference
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// A persisted user.
///
/// The id is fixed at construction and has no setter. Two users are equal
/// when their ids are equal; compare [`User::profile`] to check attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    #[serde(flatten)]
    profile: UserProfile,
}

impl User {
    pub fn new(id: UserId, profile: UserProfile) -> Self {
        Self { id, profile }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn email(&self) -> &str {
        &self.profile.email
    }

    pub fn external_id(&self) -> Option<&str> {
        self.profile.external_id.as_deref()
    }

    pub fn into_profile(self) -> UserProfile {
        self.profile
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_id() {
        let id = UserId::from("u1");
        let a = User::new(id.clone(), UserProfile::new("Ann", "ann@example.com"));
        let b = User::new(id, UserProfile::new("Annie", "annie@example.com"));
        assert_eq!(a, b);
        assert_ne!(a.profile(), b.profile());

        let c = User::new(UserId::from("u2"), a.profile().clone());
        assert_ne!(a, c);
    }

    #[test]
    fn test_json_shape_is_flat() {
        let user = User::new(
            UserId::from("u1"),
            UserProfile::new("Ann", "ann@example.com").with_external_id("fb-1"),
        );
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["external_id"], "fb-1");
        assert!(json["location"].is_null());
    }
}
