//! Cadence HTTP client
//!
//! Typed bindings for the music library REST API on top of an authenticated
//! client that attaches the session's bearer token and transparently renews
//! it when the server rejects it.

pub mod client;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder, ApiRequest, ClientError};
