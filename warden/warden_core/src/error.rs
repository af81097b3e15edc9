//! Error types for the Warden protection engine.
//!
//! A root [`Error`] wraps one enum per concern. Note that a denied action is
//! never an error: verdicts are plain booleans.

use thiserror::Error;

/// Root error type for Warden.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Bind error: {0}")]
    Bind(#[from] BindError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging initialization failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed location input, rejected before any cache or backend access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Location has no world")]
    MissingWorld,

    #[error("Coordinate {axis} is not finite: {value}")]
    NonFinite { axis: char, value: f64 },

    #[error("Coordinate {axis} is out of range: {value}")]
    OutOfRange { axis: char, value: f64 },
}

/// Failure to bind an authority to its external backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("Backend not installed: {0}")]
    NotInstalled(String),

    #[error("Backend is disabled: {0}")]
    Disabled(String),

    #[error("Backend {name} does not provide {expected}")]
    WrongKind { name: String, expected: &'static str },

    #[error("Backend rejected binding: {0}")]
    Rejected(String),
}

/// Failure reported by an external backend while answering a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend lookup failed: {0}")]
    LookupFailed(String),
}

/// Errors related to configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
