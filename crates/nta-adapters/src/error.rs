//! Error types for the source adapters.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The document is not JSON, or lacks a key the adapter needs.
  #[error("malformed source document: {0}")]
  Json(#[from] serde_json::Error),

  #[error("source document is missing {0}")]
  MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
