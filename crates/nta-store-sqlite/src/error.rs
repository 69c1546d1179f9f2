//! Error type for `nta-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The configured URI names something other than a SQLite database.
  #[error("unsupported graph uri {0:?}; expected sqlite://<path> or sqlite::memory:")]
  UnsupportedUri(String),

  /// The principal exists with a different credential.
  #[error("authentication failed for principal {0:?}")]
  AuthFailed(String),

  /// A clause referred to a variable no earlier clause bound.
  #[error("statement refers to unbound variable {0:?}")]
  UnboundVariable(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
