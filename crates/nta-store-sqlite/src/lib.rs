//! SQLite backend for the Norse text graph.
//!
//! Nodes and edges live in two tables keyed by label / relationship type and
//! the canonical JSON of the identity properties; everything else is a JSON
//! property bag. Wraps [`tokio_rusqlite`] so all database access runs on a
//! dedicated thread without blocking the async runtime.

mod encode;
mod report;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
