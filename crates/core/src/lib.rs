//! Core types and shared functionality for shellward.
//!
//! This crate provides:
//! - The versioned asset store with SQLite backend
//! - Layered application configuration
//! - Unified error types

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, StoredResponse, VersionedStore};
pub use config::AppConfig;
pub use error::Error;
