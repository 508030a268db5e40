//! Error types for the dose_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dose_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed medication definition rejected at the store boundary
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store read/write failure, surfaced to the caller unchanged
    #[error("Storage unavailable: {0}")]
    Storage(String),

    /// Programming-contract violation (a defect, not a runtime condition)
    #[error("Contract violation: {0}")]
    Contract(String),
}
