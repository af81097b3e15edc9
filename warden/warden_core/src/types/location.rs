//! Locations and location keys.
//!
//! A [`Location`] is a runtime position with fractional coordinates. A
//! [`LocationKey`] is the discrete cell that contains it, and is what
//! verdicts are cached under.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::error::LocationError;
use crate::id::WorldId;

/// A position in a world, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// The world this position is in.
    pub world: WorldId,

    /// X coordinate.
    pub x: f64,

    /// Y coordinate.
    pub y: f64,

    /// Z coordinate.
    pub z: f64,
}

impl Location {
    /// Create a new location.
    pub fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z }
    }

    /// Derive the key of the cell containing this location.
    ///
    /// Fails for a nil world, a non-finite coordinate, or a coordinate
    /// outside the `i32` range.
    pub fn key(&self) -> Result<LocationKey, LocationError> {
        if self.world.is_nil() {
            return Err(LocationError::MissingWorld);
        }

        Ok(LocationKey {
            world: self.world,
            x: to_cell('x', self.x)?,
            y: to_cell('y', self.y)?,
            z: to_cell('z', self.z)?,
        })
    }
}

fn to_cell(axis: char, value: f64) -> Result<i32, LocationError> {
    if !value.is_finite() {
        return Err(LocationError::NonFinite { axis, value });
    }

    let floored = value.floor();
    if floored < f64::from(i32::MIN) || floored > f64::from(i32::MAX) {
        return Err(LocationError::OutOfRange { axis, value });
    }

    Ok(floored as i32)
}

/// An immutable, discrete spatial cell: world plus integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    world: WorldId,
    x: i32,
    y: i32,
    z: i32,
}

impl LocationKey {
    /// Create a key from cell coordinates.
    pub fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self { world, x, y, z }
    }

    pub fn world(&self) -> WorldId {
        self.world
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn z(&self) -> i32 {
        self.z
    }
}

impl From<LocationKey> for Location {
    fn from(key: LocationKey) -> Self {
        Self::new(key.world, f64::from(key.x), f64::from(key.y), f64::from(key.z))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_floors_coordinates() {
        let world = WorldId::new();
        let key = Location::new(world, 10.7, 64.0, -0.5).key().unwrap();
        assert_eq!(key, LocationKey::new(world, 10, 64, -1));
    }

    #[test]
    fn test_positions_in_same_cell_share_a_key() {
        let world = WorldId::new();
        let a = Location::new(world, 3.1, 70.9, 8.0).key().unwrap();
        let b = Location::new(world, 3.9, 70.2, 8.99).key().unwrap();
        assert_eq!(a, b);

        let mut keys = HashSet::new();
        keys.insert(a);
        assert!(keys.contains(&b));
    }

    #[test]
    fn test_different_worlds_are_different_keys() {
        let a = LocationKey::new(WorldId::new(), 1, 2, 3);
        let b = LocationKey::new(WorldId::new(), 1, 2, 3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_locations() {
        let world = WorldId::new();

        assert_eq!(
            Location::new(WorldId::nil(), 0.0, 0.0, 0.0).key(),
            Err(LocationError::MissingWorld)
        );
        assert!(matches!(
            Location::new(world, f64::NAN, 0.0, 0.0).key(),
            Err(LocationError::NonFinite { axis: 'x', .. })
        ));
        assert!(matches!(
            Location::new(world, 0.0, f64::INFINITY, 0.0).key(),
            Err(LocationError::NonFinite { axis: 'y', .. })
        ));
        assert!(matches!(
            Location::new(world, 0.0, 0.0, 1e12).key(),
            Err(LocationError::OutOfRange { axis: 'z', .. })
        ));
    }

    #[test]
    fn test_key_round_trips_through_location() {
        let key = LocationKey::new(WorldId::new(), -5, 12, 300);
        assert_eq!(Location::from(key).key().unwrap(), key);
    }
}
