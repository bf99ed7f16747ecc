//! Error types for mopsos-core (WASM-compatible)

use thiserror::Error;

/// Result type alias for mopsos-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that work in both native and WASM environments
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Unknown time range: {0} (expected 30d, 90d, 1y or all)")]
    UnknownTimeRange(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("Please enter a valid number of months")]
    InvalidMonths,

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}
