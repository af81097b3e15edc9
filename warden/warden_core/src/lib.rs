//! # Warden Core
//!
//! Core types shared by the Warden protection engine.
//!
//! This crate defines the values that flow through a permission query:
//!
//! - Typed identifiers for principals and worlds
//! - Runtime locations and the discrete location keys derived from them
//! - The closed set of action kinds an authority may be asked about
//! - The error hierarchy, configuration and logging setup
//!
//! The resolution engine itself lives in `warden_protection`.

pub mod config;
pub mod error;
pub mod id;
pub mod logging;
pub mod types;

// Re-export key items for convenience
pub use config::{CacheConfig, WardenConfig};
pub use error::{BackendError, BindError, ConfigError, Error, LocationError};
pub use id::{Id, PrincipalId, WorldId};
pub use logging::{init_logging, LogLevel, LoggingConfig};
pub use types::{ActionKind, Location, LocationKey};

/// A type alias for Result with our error types
pub type Result<T, E = error::Error> = std::result::Result<T, E>;
