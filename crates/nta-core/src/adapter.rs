//! The contract between source adapters and the ingestion pipeline.
//!
//! Adapters turn a raw source (a poem JSON file, a plain-text file) into an
//! [`AdapterOutput`]: work and edition metadata plus ordered segments, each
//! carrying ordered tokens. Identifiers are optional here; the pipeline fills
//! in deterministic fallbacks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a source came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSource {
  pub source_id:    String,
  /// e.g. `"poem_json"`, `"plaintext"`.
  pub kind:         String,
  /// Path or URL.
  pub origin:       String,
  pub retrieved_at: Option<DateTime<Utc>>,
  pub notes:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkMetadata {
  pub work_id: String,
  pub title:   String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionMetadata {
  pub edition_id:           String,
  pub title:                String,
  pub source_label:         Option<String>,
  pub language:             Option<String>,
  pub language_stage:       Option<String>,
  pub date_start:           Option<i32>,
  pub date_end:             Option<i32>,
  pub normalization_policy: Option<String>,
  pub version:              Option<String>,
  pub segment_mode:         Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
  pub surface:    String,
  /// Falls back to `surface` when absent or empty.
  pub normalized: Option<String>,
  pub position:   u32,
  pub token_id:   Option<String>,
  pub char_start: Option<u32>,
  pub char_end:   Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
  pub text:       String,
  pub ordinal:    u32,
  pub tokens:     Vec<TokenRecord>,
  #[serde(rename = "ref")]
  pub reference:  Option<String>,
  pub segment_id: Option<String>,
  pub verse:      Option<String>,
  pub strophe:    Option<String>,
  pub line:       Option<String>,
}

impl SegmentRecord {
  pub fn new(text: impl Into<String>, ordinal: u32, tokens: Vec<TokenRecord>) -> Self {
    Self {
      text: text.into(),
      ordinal,
      tokens,
      reference: None,
      segment_id: None,
      verse: None,
      strophe: None,
      line: None,
    }
  }
}

/// Deterministic output of any adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOutput {
  pub work:     WorkMetadata,
  pub edition:  EditionMetadata,
  pub segments: Vec<SegmentRecord>,
}

impl AdapterOutput {
  pub fn token_count(&self) -> usize {
    self.segments.iter().map(|s| s.tokens.len()).sum()
  }
}

/// Implemented by every concrete adapter.
pub trait SourceAdapter {
  type Error: std::error::Error + Send + Sync + 'static;

  fn adapt(&self, raw: &RawSource) -> Result<AdapterOutput, Self::Error>;
}

/// Treat `Some("")` like `None`.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.is_empty())
}
