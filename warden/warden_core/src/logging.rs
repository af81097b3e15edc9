//! Logging setup.
//!
//! Components emit `tracing` events; this module installs the subscriber
//! that prints them.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use serde::{Serialize, Deserialize};
use tracing_subscriber::EnvFilter;

use crate::error::Error;
use crate::Result;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level.
    Error,

    /// Warning level.
    Warn,

    /// Info level.
    Info,

    /// Debug level.
    Debug,

    /// Trace level.
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` is not set.
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: false,
        }
    }
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

type InstallResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Once a call has
/// installed the subscriber, later calls return `Ok(())`. A failed install
/// is reported and the next call tries again.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    install_once(&INITIALIZED, || {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        }
    })
}

/// Run `install` unless `flag` records an earlier success.
fn install_once(flag: &AtomicBool, install: impl FnOnce() -> InstallResult) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Ok(());
    }

    install().map_err(|e| Error::Logging(e.to_string()))?;
    flag.store(true, Ordering::SeqCst);
    Ok(())
}
