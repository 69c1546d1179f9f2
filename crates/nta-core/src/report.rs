//! Query parameters and row types for the reporting queries.

use serde::{Deserialize, Serialize};

/// Filters shared by the inflection reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflectionQuery {
  pub lemma_id:    String,
  /// Inclusive lower bound on the edition's date range.
  pub from_year:   Option<i32>,
  /// Inclusive upper bound on the edition's date range.
  pub to_year:     Option<i32>,
  /// Case-insensitive substring of the edition's source label.
  pub source_like: Option<String>,
  pub limit:       u32,
}

impl InflectionQuery {
  pub fn new(lemma_id: impl Into<String>) -> Self {
    Self {
      lemma_id:    lemma_id.into(),
      from_year:   None,
      to_year:     None,
      source_like: None,
      limit:       20,
    }
  }

  pub fn has_year_bounds(&self) -> bool {
    self.from_year.is_some() || self.to_year.is_some()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceCount {
  pub surface: String,
  pub freq:    u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSurfaceCount {
  pub source_label: String,
  pub date_start:   Option<i32>,
  pub date_end:     Option<i32>,
  pub surface:      String,
  pub freq:         u64,
}

/// Missing features are reported as `"NA"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCount {
  pub case:   String,
  pub number: String,
  pub gender: String,
  pub freq:   u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
  pub source_label: String,
  pub date_start:   Option<i32>,
  pub date_end:     Option<i32>,
  pub segment_ref:  Option<String>,
  pub surface:      String,
  pub segment_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
  pub word:  String,
  pub count: u64,
}
