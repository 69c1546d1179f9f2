//! Error types for `nta-core`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The graph store credential was absent or empty.
  #[error("{0} is not set; export it or add it to .env")]
  MissingCredential(&'static str),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// A dynamically supplied label or field name failed the identifier check.
  #[error("unsafe identifier: {0:?}")]
  UnsafeIdentifier(String),

  /// Passed through unchanged from the storage backend.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The caller stopped waiting. A write already handed to the store may
  /// still complete and commit; every write is idempotent, so re-running is
  /// safe.
  #[error("store call exceeded deadline of {0:?}")]
  Timeout(Duration),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
