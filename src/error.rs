//! Error handling for fetchq.
//!
//! One error type covers every failure the crate can report. Validation
//! errors are returned to the caller right away; transfer errors never reach
//! the caller directly and are instead rendered into the task record.

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors that can happen when using fetchq.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The URL is absent, unparsable, or not http(s).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A malformed enqueue payload, e.g. an empty or non-list bulk request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A settings document or update failed validation.
    ///
    /// Nothing is applied when this is returned.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The settings could not be written to durable storage.
    ///
    /// The live configuration is left untouched when this is returned.
    #[error("Failed to save settings: {source}")]
    Persistence {
        #[source]
        source: io::Error,
    },

    /// No task with this identifier exists.
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// The server answered with a status the transfer protocol cannot use.
    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(StatusCode),

    /// The response body ended before the announced size was reached.
    #[error("Response body ended after {received} of {expected} bytes")]
    IncompleteBody { expected: u64, received: u64 },

    /// Waiting on the network took longer than the configured timeout.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// The downloader was shut down and accepts no more work.
    #[error("Downloader is shut down")]
    Shutdown,

    /// I/O Error.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the HTTP middleware stack.
    #[error("HTTP client error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// Error while encoding or decoding JSON.
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Result type alias for operations that can fail with a fetchq error.
pub type Result<T> = std::result::Result<T, Error>;
