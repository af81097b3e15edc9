//! Value types passed through a permission query.

pub mod action;
pub mod location;

pub use action::ActionKind;
pub use location::{Location, LocationKey};
