//! Checks on caller-supplied URLs.

use crate::error::{Error, Result};
use serde_json::Value;

/// Whether `url` looks like something the downloader accepts.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validates a single enqueue URL.
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::InvalidUrl("no url provided".to_string()));
    }
    if !is_http_url(url) {
        return Err(Error::InvalidUrl(
            "url must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

/// Extracts the URL list from a bulk enqueue payload.
///
/// The payload must be a non-empty JSON array. Entries that are not strings
/// are dropped here; string entries are validated later, one by one.
pub fn urls_from_json(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) if items.is_empty() => {
            Err(Error::InvalidRequest("no urls provided".to_string()))
        }
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect()),
        Value::Null => Err(Error::InvalidRequest("no urls provided".to_string())),
        _ => Err(Error::InvalidRequest("urls must be a list".to_string())),
    }
}
