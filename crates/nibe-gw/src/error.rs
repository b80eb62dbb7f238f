//! Gateway error types.
//!
//! Decode and transport failures inside the bridge loop are transient by
//! design and never surface here; these errors cover startup only.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can stop the gateway from starting.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// Signal handler installation failed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// Other I/O error during startup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
