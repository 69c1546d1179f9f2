//! Graph store connection settings.
//!
//! Built once at process start and handed to the store constructor; nothing
//! in this crate reads the environment.

use std::fmt;

use crate::{Error, Result};

pub const DEFAULT_URI: &str = "sqlite://nta.db";
pub const DEFAULT_USER: &str = "nta";

/// Name reported when the credential is missing.
pub const PASSWORD_VAR: &str = "NTA_GRAPH__PASSWORD";

#[derive(Clone, PartialEq, Eq)]
pub struct GraphConfig {
  pub uri:  String,
  pub user: String,
  password: String,
}

impl GraphConfig {
  /// Fails with [`Error::MissingCredential`] when `password` is absent or
  /// empty, before any store is touched.
  pub fn new(
    uri: impl Into<String>,
    user: impl Into<String>,
    password: Option<String>,
  ) -> Result<Self> {
    let password = password
      .filter(|p| !p.is_empty())
      .ok_or(Error::MissingCredential(PASSWORD_VAR))?;
    let uri = uri.into();
    if uri.trim().is_empty() {
      return Err(Error::InvalidConfig("graph uri is empty".into()));
    }
    Ok(Self { uri, user: user.into(), password })
  }

  pub fn password(&self) -> &str { &self.password }
}

impl fmt::Debug for GraphConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GraphConfig")
      .field("uri", &self.uri)
      .field("user", &self.user)
      .field("password", &"<redacted>")
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_password_is_a_configuration_error() {
    let err = GraphConfig::new(DEFAULT_URI, DEFAULT_USER, None).unwrap_err();
    assert!(matches!(err, Error::MissingCredential(PASSWORD_VAR)));

    let err =
      GraphConfig::new(DEFAULT_URI, DEFAULT_USER, Some(String::new())).unwrap_err();
    assert!(matches!(err, Error::MissingCredential(_)));
  }

  #[test]
  fn empty_uri_is_rejected() {
    let err = GraphConfig::new("  ", DEFAULT_USER, Some("pw".into())).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
  }

  #[test]
  fn debug_output_redacts_password() {
    let cfg = GraphConfig::new(DEFAULT_URI, DEFAULT_USER, Some("hunter2".into()))
      .unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("hunter2"));
    assert_eq!(cfg.password(), "hunter2");
  }
}
