//! Entity records, one per node kind in the graph.
//!
//! Records are plain values. Identity is the `*_id` field (or the
//! `(key, value)` pair for [`Feature`]); relationships are never embedded and
//! live only as graph edges written by the repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Part-of-speech value used when nothing better is known.
pub const UNKNOWN_POS: &str = "UNKNOWN";

// ─── Text hierarchy ──────────────────────────────────────────────────────────

/// An abstract literary work, independent of any witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
  pub work_id: String,
  pub title:   String,
}

/// A concrete witness of a work: a print, manuscript or translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edition {
  pub edition_id:           String,
  pub work_id:              String,
  pub label:                Option<String>,
  pub version:              Option<String>,
  /// Human-readable provenance; reports filter on it.
  pub source_label:         Option<String>,
  pub language:             Option<String>,
  pub language_stage:       Option<String>,
  pub date_start:           Option<i32>,
  pub date_end:             Option<i32>,
  pub normalization_policy: Option<String>,
  pub segment_mode:         Option<String>,
}

impl Edition {
  pub fn new(edition_id: impl Into<String>, work_id: impl Into<String>) -> Self {
    Self {
      edition_id:           edition_id.into(),
      work_id:              work_id.into(),
      label:                None,
      version:              None,
      source_label:         None,
      language:             None,
      language_stage:       None,
      date_start:           None,
      date_end:             None,
      normalization_policy: None,
      segment_mode:         None,
    }
  }
}

/// A line, verse-line or paragraph within an edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
  pub segment_id: String,
  pub edition_id: String,
  pub text:       String,
  pub position:   u32,
  #[serde(rename = "ref")]
  pub reference:  Option<String>,
  pub verse:      Option<String>,
  pub strophe:    Option<String>,
  pub line:       Option<String>,
}

/// One word occurrence within a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
  pub token_id:   String,
  pub segment_id: String,
  pub surface:    String,
  pub position:   u32,
  pub normalized: Option<String>,
  pub char_start: Option<u32>,
  pub char_end:   Option<u32>,
}

// ─── Lexicon ─────────────────────────────────────────────────────────────────

/// A distinct spelling in a given language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
  pub form_id:     String,
  pub orthography: String,
  pub language:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
  pub lemma_id: String,
  pub headword: String,
  pub language: String,
  pub pos:      Option<String>,
}

// ─── Morphology ──────────────────────────────────────────────────────────────

/// One analyzer's reading of a token. Superseded analyses stay in the graph
/// with `is_active = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphAnalysis {
  pub analysis_id:      String,
  pub analyzer:         String,
  pub confidence:       f64,
  pub pos:              String,
  pub is_ambiguous:     bool,
  pub analyzer_version: Option<String>,
  /// Stamped by the repository on first write when absent.
  pub created_at:       Option<DateTime<Utc>>,
  pub supersedes:       Option<String>,
  pub is_active:        bool,
}

/// A grammatical feature; identity is the `(key, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
  pub key:         String,
  pub value:       String,
  pub lemma_guess: Option<String>,
}

/// The program that produced a set of analyses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
  pub analyzer_id: String,
  pub name:        String,
  pub version:     String,
  pub description: Option<String>,
  pub author:      Option<String>,
}

// ─── Scholarship ─────────────────────────────────────────────────────────────

/// An assertion (e.g. an etymology) about some entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
  pub claim_id:   String,
  #[serde(rename = "type")]
  pub claim_type: String,
  pub statement:  String,
  pub confidence: Option<f64>,
  pub status:     Option<String>,
}

/// A bibliographic reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub source_id: String,
  pub citekey:   String,
  pub title:     String,
  pub year:      Option<i32>,
  pub authors:   Option<Vec<String>>,
  pub url:       Option<String>,
}
