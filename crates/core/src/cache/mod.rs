//! SQLite-backed versioned asset store.
//!
//! This module provides the persistent store behind the worker, keyed by
//! (cache version, request URL) with async access via tokio-rusqlite.
//! It supports:
//!
//! - One store per cache version, destroyed wholesale on version rotation
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Last-write-wins UPSERT per request key

pub mod connection;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{StoredResponse, VersionedStore};
