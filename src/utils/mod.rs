//! Shared utility functions.
//!
//! - [`content_length`] - size probing from response headers
//! - [`filename`] - sequential destination names and extension guessing
//! - [`dir_size`] - recursive disk usage
//! - [`url`] - enqueue URL validation

pub mod content_length;
pub mod dir_size;
pub mod filename;
pub mod url;

pub use content_length::content_length;
pub use dir_size::directory_size;
pub use filename::{extension_for, FileNamer, DEFAULT_EXTENSION};
pub use url::{is_http_url, urls_from_json, validate_url};
