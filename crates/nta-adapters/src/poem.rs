//! Adapter for verse/strophe/line structured poem JSON.
//!
//! ```json
//! {
//!   "information": { "cover": [...], "writer": [...] },
//!   "poem": {
//!     "title": "Hávamál",
//!     "verses": [
//!       { "verse": 1, "strophes": [ { "strophe": 1, "lines": ["Gáttir allar", ...] } ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Every line becomes one segment; every token carries its normalized form
//! under policy v0.

use std::path::Path;

use nta_core::{
  adapter::{
    AdapterOutput, EditionMetadata, RawSource, SegmentRecord, SourceAdapter,
    TokenRecord, WorkMetadata,
  },
  ids::safe_ref_part,
  text::{NORMALIZATION_POLICY_V0, normalize, tokenize_spans},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result, read_source};

// ─── Document shape ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PoemDocument {
  pub information: Information,
  pub poem:        Poem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Information {
  pub cover:  Vec<Value>,
  pub writer: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Poem {
  pub title:  String,
  pub verses: Vec<Verse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Verse {
  /// Number or string.
  pub verse:    Value,
  pub strophes: Vec<Strophe>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Strophe {
  pub strophe: Value,
  pub lines:   Vec<String>,
}

impl PoemDocument {
  pub fn from_json(input: &str) -> Result<Self> { Ok(serde_json::from_str(input)?) }
}

/// Render a verse or strophe label; numbers and strings are accepted.
fn label(value: &Value, field: &'static str) -> Result<String> {
  match value {
    Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
    Value::Number(n) => Ok(n.to_string()),
    _ => Err(Error::MissingField(field)),
  }
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// Edition-level facts the document does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoemConfig {
  pub work_id:      String,
  pub edition_id:   String,
  pub language:     String,
  pub source_label: String,
  pub date_start:   Option<i32>,
  pub date_end:     Option<i32>,
  pub version:      Option<String>,
}

impl Default for PoemConfig {
  /// The Guðni Jónsson print of Hávamál.
  fn default() -> Self {
    Self {
      work_id:      "havamal".into(),
      edition_id:   "havamal_gudni_jonsson_print".into(),
      language:     "Old Norse".into(),
      source_label: "Sæmundar-Edda: Hávamál".into(),
      date_start:   Some(900),
      date_end:     Some(1100),
      version:      None,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct PoemJsonAdapter {
  pub config: PoemConfig,
}

impl PoemJsonAdapter {
  pub fn new(config: PoemConfig) -> Self { Self { config } }

  pub fn adapt_path(&self, path: &Path) -> Result<AdapterOutput> {
    let document = PoemDocument::from_json(&read_source(path)?)?;
    self.adapt_document(&document)
  }

  pub fn adapt_document(&self, document: &PoemDocument) -> Result<AdapterOutput> {
    let config = &self.config;
    let poem = &document.poem;
    debug!(
      title = %poem.title,
      writers = document.information.writer.len(),
      cover_entries = document.information.cover.len(),
      "adapting poem"
    );

    let mut segments = Vec::new();
    let mut ordinal = 0u32;

    for verse in &poem.verses {
      let verse_ref = label(&verse.verse, "verse number")?;

      for strophe in &verse.strophes {
        let strophe_ref = label(&strophe.strophe, "strophe number")?;

        for (line_index, line) in strophe.lines.iter().enumerate() {
          ordinal += 1;
          let segment_id = format!(
            "{}:v{}:s{}:l{line_index}",
            config.edition_id,
            safe_ref_part(&verse_ref),
            safe_ref_part(&strophe_ref),
          );

          let mut segment = SegmentRecord::new(line.as_str(), ordinal, line_tokens(line));
          segment.segment_id = Some(segment_id);
          segment.reference = Some(format!("{verse_ref}.{strophe_ref}.{line_index}"));
          segment.verse = Some(verse_ref.clone());
          segment.strophe = Some(strophe_ref.clone());
          segment.line = Some(line_index.to_string());
          segments.push(segment);
        }
      }
    }

    Ok(AdapterOutput {
      work: WorkMetadata {
        work_id: config.work_id.clone(),
        title:   poem.title.clone(),
      },
      edition: EditionMetadata {
        edition_id:           config.edition_id.clone(),
        title:                poem.title.clone(),
        source_label:         Some(config.source_label.clone()),
        language:             Some(config.language.clone()),
        language_stage:       None,
        date_start:           config.date_start,
        date_end:             config.date_end,
        normalization_policy: Some(NORMALIZATION_POLICY_V0.into()),
        version:              config.version.clone(),
        segment_mode:         Some("line".into()),
      },
      segments,
    })
  }
}

impl SourceAdapter for PoemJsonAdapter {
  type Error = Error;

  fn adapt(&self, raw: &RawSource) -> Result<AdapterOutput> {
    self.adapt_path(Path::new(&raw.origin))
  }
}

/// Tokens of one line with normalized forms and char offsets.
pub(crate) fn line_tokens(line: &str) -> Vec<TokenRecord> {
  tokenize_spans(line)
    .into_iter()
    .zip(0u32..)
    .map(|(span, position)| TokenRecord {
      normalized: Some(normalize(&span.text)),
      surface: span.text,
      position,
      token_id: None,
      char_start: Some(span.char_start),
      char_end: Some(span.char_end),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  const SAMPLE: &str = r#"{
    "information": { "cover": ["Eddukvæði"], "writer": ["Guðni Jónsson"] },
    "poem": {
      "title": "Hávamál",
      "verses": [
        { "verse": 1, "strophes": [
          { "strophe": 1, "lines": ["Gáttir allar,", "áðr gangi fram,"] }
        ] },
        { "verse": "2 b", "strophes": [
          { "strophe": "I.", "lines": ["“skoðask skyli”"] }
        ] }
      ]
    }
  }"#;

  fn adapt(input: &str) -> Result<AdapterOutput> {
    PoemJsonAdapter::default().adapt_document(&PoemDocument::from_json(input)?)
  }

  #[test]
  fn segments_follow_verse_strophe_line() {
    let output = adapt(SAMPLE).unwrap();
    let ids: Vec<_> = output
      .segments
      .iter()
      .map(|s| s.segment_id.clone().unwrap())
      .collect();
    assert_eq!(ids, vec![
      "havamal_gudni_jonsson_print:v1:s1:l0",
      "havamal_gudni_jonsson_print:v1:s1:l1",
      "havamal_gudni_jonsson_print:v2_b:si:l0",
    ]);

    let ordinals: Vec<_> = output.segments.iter().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
    assert_eq!(output.segments[2].reference.as_deref(), Some("2 b.I..0"));
    assert_eq!(output.segments[2].verse.as_deref(), Some("2 b"));
  }

  #[test]
  fn tokens_are_cleaned_and_positioned() {
    let output = adapt(SAMPLE).unwrap();
    let first = &output.segments[0].tokens;
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].surface, "Gáttir");
    assert_eq!(first[1].surface, "allar");
    assert_eq!(first[1].position, 1);
    assert_eq!(first[1].char_start, Some(7));

    let quoted = &output.segments[2].tokens;
    assert_eq!(quoted[0].surface, "skoðask");
    assert_eq!(quoted[1].normalized.as_deref(), Some("skyli"));
    assert_eq!(output.token_count(), 7);
  }

  #[test]
  fn edition_metadata_comes_from_config() {
    let output = adapt(SAMPLE).unwrap();
    assert_eq!(output.work.work_id, "havamal");
    assert_eq!(output.work.title, "Hávamál");
    assert_eq!(output.edition.source_label.as_deref(), Some("Sæmundar-Edda: Hávamál"));
    assert_eq!(output.edition.language.as_deref(), Some("Old Norse"));
    assert_eq!(output.edition.date_start, Some(900));
    assert_eq!(
      output.edition.normalization_policy.as_deref(),
      Some(NORMALIZATION_POLICY_V0)
    );
  }

  #[test]
  fn missing_keys_abort() {
    let no_poem = r#"{ "information": { "cover": [], "writer": [] } }"#;
    assert!(matches!(adapt(no_poem), Err(Error::Json(_))));

    let no_lines = r#"{
      "information": { "cover": [], "writer": [] },
      "poem": { "title": "x", "verses": [ { "verse": 1, "strophes": [ { "strophe": 1 } ] } ] }
    }"#;
    assert!(matches!(adapt(no_lines), Err(Error::Json(_))));

    let null_label = r#"{
      "information": { "cover": [], "writer": [] },
      "poem": { "title": "x", "verses": [ { "verse": null, "strophes": [] } ] }
    }"#;
    assert!(matches!(adapt(null_label), Err(Error::MissingField("verse number"))));
  }

  #[test]
  fn adapts_a_file_through_the_trait() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();

    let raw = RawSource {
      source_id:    "havamal-json".into(),
      kind:         "poem_json".into(),
      origin:       file.path().to_string_lossy().into_owned(),
      retrieved_at: None,
      notes:        None,
    };
    let output = PoemJsonAdapter::default().adapt(&raw).unwrap();
    assert_eq!(output.segments.len(), 3);

    let missing = RawSource { origin: "/nonexistent/poem.json".into(), ..raw };
    assert!(matches!(
      PoemJsonAdapter::default().adapt(&missing),
      Err(Error::Io { .. })
    ));
  }
}
