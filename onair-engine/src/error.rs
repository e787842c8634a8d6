//! Error types for onair-engine
//!
//! Loading failures drop a single item, an empty job triggers the fallback
//! path, and anything else fails one runner iteration. None of them stop a
//! station.

use thiserror::Error;

/// Main error type for the station engine
#[derive(Error, Debug)]
pub enum Error {
    /// Error surfaced from the shared library
    #[error(transparent)]
    Common(#[from] onair_common::Error),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An asset could not be loaded
    #[error("Asset load error ({asset}): {reason}")]
    Load { asset: String, reason: String },

    /// A composed job had no playable items after loading
    #[error("Sequence job for station {0} has no playable items")]
    EmptyJob(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A runner iteration failed
    #[error("Runner error: {0}")]
    Runner(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn load(asset: impl Into<String>, reason: impl ToString) -> Self {
        Error::Load {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
