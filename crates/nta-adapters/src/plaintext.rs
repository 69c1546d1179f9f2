//! Adapter for UTF-8 plain text, segmented by line or by paragraph.

use std::{fmt, path::Path, str::FromStr, sync::LazyLock};

use nta_core::{
  adapter::{
    AdapterOutput, EditionMetadata, RawSource, SegmentRecord, SourceAdapter,
    WorkMetadata,
  },
  text::NORMALIZATION_POLICY_V0,
};
use regex::Regex;

use crate::{Error, Result, poem::line_tokens, read_source};

const PLAINTEXT_VERSION: &str = "plaintext_v1";

static PARAGRAPH_BREAK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("paragraph pattern compiles"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmentMode {
  /// One segment per non-blank line.
  #[default]
  Line,
  /// One segment per blank-line separated block.
  Paragraph,
}

impl SegmentMode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Line => "line",
      Self::Paragraph => "paragraph",
    }
  }

  /// Trimmed, non-empty segments of `text` in document order.
  pub fn split(self, text: &str) -> Vec<String> {
    match self {
      Self::Line => text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect(),
      Self::Paragraph => {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        PARAGRAPH_BREAK
          .split(&unified)
          .map(str::trim)
          .filter(|chunk| !chunk.is_empty())
          .map(str::to_owned)
          .collect()
      }
    }
  }
}

impl fmt::Display for SegmentMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown segment mode {0:?}; expected `line` or `paragraph`")]
pub struct UnknownSegmentMode(pub String);

impl FromStr for SegmentMode {
  type Err = UnknownSegmentMode;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "line" => Ok(Self::Line),
      "paragraph" => Ok(Self::Paragraph),
      other => Err(UnknownSegmentMode(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaintextConfig {
  pub work_id:        String,
  pub edition_id:     String,
  pub source_label:   String,
  /// Language or stage code such as `on`, `nn`, `nb`.
  pub language_stage: String,
  pub date_start:     Option<i32>,
  pub date_end:       Option<i32>,
  pub mode:           SegmentMode,
}

#[derive(Debug, Clone)]
pub struct PlaintextAdapter {
  pub config: PlaintextConfig,
}

impl PlaintextAdapter {
  pub fn new(config: PlaintextConfig) -> Self { Self { config } }

  pub fn adapt_path(&self, path: &Path) -> Result<AdapterOutput> {
    Ok(self.adapt_text(&read_source(path)?))
  }

  /// Segments carry no explicit ids; ingestion derives them from the
  /// edition and ordinal.
  pub fn adapt_text(&self, text: &str) -> AdapterOutput {
    let config = &self.config;
    let segments = config
      .mode
      .split(text)
      .into_iter()
      .zip(1u32..)
      .map(|(segment, ordinal)| {
        let tokens = line_tokens(&segment);
        SegmentRecord::new(segment, ordinal, tokens)
      })
      .collect();

    AdapterOutput {
      work: WorkMetadata {
        work_id: config.work_id.clone(),
        title:   config.work_id.clone(),
      },
      edition: EditionMetadata {
        edition_id:           config.edition_id.clone(),
        title:                config.work_id.clone(),
        source_label:         Some(config.source_label.clone()),
        language:             Some(config.language_stage.clone()),
        language_stage:       Some(config.language_stage.clone()),
        date_start:           config.date_start,
        date_end:             config.date_end,
        normalization_policy: Some(NORMALIZATION_POLICY_V0.into()),
        version:              Some(PLAINTEXT_VERSION.into()),
        segment_mode:         Some(config.mode.as_str().into()),
      },
      segments,
    }
  }
}

impl SourceAdapter for PlaintextAdapter {
  type Error = Error;

  fn adapt(&self, raw: &RawSource) -> Result<AdapterOutput> {
    self.adapt_path(Path::new(&raw.origin))
  }
}
