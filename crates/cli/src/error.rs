//! Error types for mopsos CLI (native-only errors)

use std::time::Duration;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// CLI-specific error types (includes native dependencies)
#[derive(Error, Debug)]
pub enum Error {
    #[error("Core error: {0}")]
    Core(#[from] mopsos_core::Error),

    #[error("Query service error: {0}")]
    Api(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{resource} did not respond within {after:?}")]
    Timeout { resource: String, after: Duration },

    #[error("Failed to load {resource}: {reason}")]
    CriticalResource { resource: String, reason: String },

    #[error("Discarded response for {0}, the view has moved on")]
    Stale(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
