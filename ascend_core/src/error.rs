//! Error types for the ascend_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ascend_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// User-facing validation error (no reps/time entered, nothing to log)
    #[error("{0}")]
    Validation(String),

    /// Recommendation backend failure
    #[error("Recommendation error: {0}")]
    Recommendation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
