//! Process configuration: `nta.toml`, then `NTA_*` environment variables.
//!
//! Nested keys use a double underscore, so `graph.password` is read from
//! `NTA_GRAPH__PASSWORD`. A `.env` file in the working directory is loaded
//! into the environment first.

use std::{path::Path, time::Duration};

use anyhow::Context as _;
use nta_core::config::{DEFAULT_URI, DEFAULT_USER, GraphConfig};
use serde::Deserialize;

#[derive(Deserialize, Default)]
pub struct Settings {
  #[serde(default)]
  pub graph: GraphSettings,
}

#[derive(Deserialize)]
pub struct GraphSettings {
  #[serde(default = "default_uri")]
  pub uri:          String,
  #[serde(default = "default_user")]
  pub user:         String,
  #[serde(default)]
  pub password:     Option<String>,
  /// Upper bound on each store call.
  #[serde(default)]
  pub timeout_secs: Option<u64>,
}

fn default_uri() -> String { DEFAULT_URI.to_owned() }

fn default_user() -> String { DEFAULT_USER.to_owned() }

impl Default for GraphSettings {
  fn default() -> Self {
    Self {
      uri:          default_uri(),
      user:         default_user(),
      password:     None,
      timeout_secs: None,
    }
  }
}

impl GraphSettings {
  /// Fails before any store is opened when the credential is missing.
  pub fn connection(&self) -> nta_core::Result<GraphConfig> {
    GraphConfig::new(&self.uri, &self.user, self.password.clone())
  }

  pub fn deadline(&self) -> Option<Duration> {
    self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
  }
}

impl Settings {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    dotenvy::dotenv().ok();

    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("NTA")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise configuration")
  }
}
