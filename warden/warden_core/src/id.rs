//! Strongly-typed identifiers.
//!
//! Principals and worlds are both identified by UUIDs. Wrapping them in a
//! phantom-typed [`Id`] keeps the two from being mixed up at call sites.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// A type-safe identifier based on UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an identifier from a specific UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: PhantomData,
        }
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Create a nil (all zeros) identifier.
    pub const fn nil() -> Self {
        Self::from_uuid(Uuid::nil())
    }

    /// Whether this is the nil identifier.
    pub fn is_nil(&self) -> bool {
        self.uuid.is_nil()
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_uuid(Uuid::parse_str(s)?))
    }
}

/// Marker type for principals (players).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrincipalMarker;
/// Identifier for the actor a permission check is evaluated against.
pub type PrincipalId = Id<PrincipalMarker>;

/// Marker type for worlds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldMarker;
/// Identifier for a world.
pub type WorldId = Id<WorldMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_new() {
        let id1 = PrincipalId::new();
        let id2 = PrincipalId::new();
        assert_ne!(id1, id2, "Generated IDs should be unique");
    }

    #[test]
    fn test_id_from_str() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = PrincipalId::from_str(uuid_str).unwrap();
        assert_eq!(id.to_string(), uuid_str);
        assert!(WorldId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_nil() {
        assert!(WorldId::nil().is_nil());
        assert!(!WorldId::new().is_nil());
    }

    #[test]
    fn test_serde_is_transparent() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = PrincipalId::from_str(uuid_str).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid_str));

        let back: PrincipalId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_same_uuid_different_kinds() {
        let same_uuid = Uuid::new_v4();
        let principal = PrincipalId::from_uuid(same_uuid);
        let world = WorldId::from_uuid(same_uuid);

        // Different ID types are different types, even with the same UUID
        assert_eq!(principal.uuid(), world.uuid());
    }
}
