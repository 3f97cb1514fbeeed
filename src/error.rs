//! Error types for DevHost Guard
//!
//! Host decisions themselves never fail: every parsing problem is folded into
//! a deny. The types here cover everything around the decision, namely
//! building the guard configuration and running the demo server.

use thiserror::Error;

/// The main error type for DevHost Guard operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Guard configuration errors
///
/// Only the shape of the configuration is validated. Pattern contents are
/// taken as given.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A host pattern was an empty string
    #[error("Host pattern cannot be empty")]
    EmptyPattern,

    /// Rejection status is neither 400 nor 403
    #[error("Invalid rejection status: {0} (expected 400 or 403)")]
    InvalidRejectStatus(String),

    /// An environment variable could not be read
    #[error("Invalid value for {name}: {reason}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result type alias for DevHost Guard operations
pub type Result<T> = std::result::Result<T, Error>;
