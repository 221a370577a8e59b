//! HTTP client construction.
//!
//! - [`client`] - [`create_http_client`] and its [`HttpClientConfig`]

pub mod client;

pub use client::{create_http_client, HttpClientConfig};
