//! Connection settings, validated before any request is issued

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Per-request deadline when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Longest deadline accepted
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Favorites file used when none is configured
pub const DEFAULT_FAVORITES_FILE: &str = "mopsos-favorites.json";

/// Validated settings for talking to the query service
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub api_key: String,
    pub timeout: Duration,
}

impl Config {
    pub fn new(api_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            api_url: validate_api_url(api_url)?,
            api_key: validate_api_key(api_key)?,
            timeout: validate_timeout(timeout_secs)?,
        })
    }
}

/// Parse the service base URL; only http and https are accepted
pub fn validate_api_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("API URL cannot be empty".to_string()));
    }

    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::Validation(format!(
                "API URL must use http or https, got '{}'",
                other
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(Error::Validation("API URL must include a host".to_string()));
    }

    Ok(url)
}

/// The key is sent verbatim in headers, so it must be a single printable token
pub fn validate_api_key(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Validation("API key cannot be empty".to_string()));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::Validation(
            "API key contains whitespace or control characters".to_string(),
        ));
    }
    Ok(key.to_string())
}

/// Deadline must be between 1 second and `MAX_TIMEOUT_SECS`
pub fn validate_timeout(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::Validation(
            "Timeout must be greater than 0".to_string(),
        ));
    }
    if secs > MAX_TIMEOUT_SECS {
        return Err(Error::Validation(format!(
            "Timeout must be at most {} seconds",
            MAX_TIMEOUT_SECS
        )));
    }
    Ok(Duration::from_secs(secs))
}

/// The favorites file may not exist yet, but it cannot be a directory
pub fn validate_favorites_file(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::Validation(
            "Favorites file path cannot be empty".to_string(),
        ));
    }
    if path.is_dir() {
        return Err(Error::Validation(format!(
            "Favorites file '{}' is a directory",
            path.display()
        )));
    }
    Ok(())
}
