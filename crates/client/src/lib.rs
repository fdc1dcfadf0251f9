//! Network client for shellward.
//!
//! This crate provides the HTTP fetch pipeline, URL canonicalization, and
//! the [`Network`] trait the worker routes requests through.

pub mod fetch;
pub mod net;

pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use net::Network;

pub use reqwest::StatusCode;
pub use reqwest::header::HeaderMap;
pub use url::Url;
