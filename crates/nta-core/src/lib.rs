//! Core types and the identity / upsert model for the Norse text graph.
//!
//! This crate is free of database and file-format dependencies. Storage
//! backends implement [`store::GraphStore`]; source adapters emit
//! [`adapter::AdapterOutput`]; everything in between (identifier derivation,
//! normalization, the repository write protocol and the ingestion pipeline)
//! lives here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod adapter;
pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod ids;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod repo;
pub mod store;
pub mod text;

pub use error::{Error, Result};
