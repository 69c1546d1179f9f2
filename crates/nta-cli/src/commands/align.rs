//! Manual line-level alignment of the first Hávamál stanza with an English
//! demo translation.

use std::path::Path;

use nta_adapters::PoemDocument;
use nta_core::{
  ids::{self, safe_ref_part},
  model::{Edition, Segment, Work},
  repo::Repository,
  store::GraphStore,
};
use serde_json::Value;
use tracing::{info, warn};

pub const DEFAULT_SOURCE_EDITION: &str = "havamal_json_v1";
pub const DEFAULT_TRANSLATION_EDITION: &str = "havamal_en_demo_v1";

const ALIGNMENT_METHOD: &str = "manual";

const TRANSLATION_LINES: &[&str] = &[
  "All doors,",
  "before one walks forward,",
  "should be looked over,",
  "should be looked around,",
  "for it is uncertain to know,",
  "where enemies",
  "sit ahead in the hall.",
];

/// Used when the poem file is missing or has no usable first stanza.
const FALLBACK_LINES: &[&str] = &[
  "Gáttir allar,",
  "áðr gangi fram,",
  "um skoðask skyli,",
  "um skyggnast skyli,",
  "því at óvíst er at vita,",
  "hvar óvinir",
  "sitja á fleti fyrir.",
];

/// Verse label, strophe label and lines of a stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
  pub verse:   String,
  pub strophe: String,
  pub lines:   Vec<String>,
}

impl Stanza {
  fn fallback() -> Self {
    Self {
      verse:   "I.".into(),
      strophe: "1.".into(),
      lines:   FALLBACK_LINES.iter().map(|l| (*l).to_owned()).collect(),
    }
  }

  /// The first strophe of the first verse, or the built-in stanza.
  pub fn first_of(path: &Path) -> Self {
    let document = std::fs::read_to_string(path)
      .map_err(|e| e.to_string())
      .and_then(|raw| PoemDocument::from_json(&raw).map_err(|e| e.to_string()));

    match document {
      Ok(document) => Self::first_in(&document).unwrap_or_else(|| {
        warn!(path = %path.display(), "first stanza is empty; using built-in lines");
        Self::fallback()
      }),
      Err(reason) => {
        warn!(path = %path.display(), %reason, "cannot load poem; using built-in lines");
        Self::fallback()
      }
    }
  }

  fn first_in(document: &PoemDocument) -> Option<Self> {
    let verse = document.poem.verses.first()?;
    let strophe = verse.strophes.first()?;
    let lines: Vec<String> = strophe
      .lines
      .iter()
      .map(|line| line.trim())
      .filter(|line| !line.is_empty())
      .map(str::to_owned)
      .collect();
    if lines.is_empty() {
      return None;
    }
    Some(Self {
      verse: label_or(&verse.verse, "I."),
      strophe: label_or(&strophe.strophe, "1."),
      lines,
    })
  }
}

fn label_or(value: &Value, fallback: &str) -> String {
  match value {
    Value::String(s) if !s.is_empty() => s.clone(),
    Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
    _ => fallback.to_owned(),
  }
}

pub fn aligned_segment_id(edition_id: &str, stanza: &Stanza, line: u32) -> String {
  format!(
    "{edition_id}:{}:{}:{line}",
    safe_ref_part(&stanza.verse),
    safe_ref_part(&stanza.strophe)
  )
}

fn aligned_ref(stanza: &Stanza, line: u32) -> String {
  format!("verse={}|strophe={}|line={line}", stanza.verse, stanza.strophe)
}

/// Write both editions, their segments and one `ALIGNED_TO` edge per line
/// pair. Returns the number of aligned pairs.
pub async fn align_demo<S: GraphStore>(
  repo: &Repository<'_, S>,
  stanza: &Stanza,
  source_edition_id: &str,
  translation_edition_id: &str,
) -> nta_core::Result<usize> {
  let work = Work { work_id: ids::work_id("havamal"), title: "Hávamál".into() };

  let mut source = Edition::new(source_edition_id, &work.work_id);
  source.label = Some("Old Norse source (demo alignment subset)".into());
  source.version = Some("v1".into());

  let mut translation = Edition::new(translation_edition_id, &work.work_id);
  translation.label = Some("English translation demo".into());
  translation.version = Some("v1".into());

  repo.upsert_work(&work).await?;
  repo.upsert_edition(&source).await?;
  repo.upsert_edition(&translation).await?;
  repo.link_work_edition(&work.work_id, source_edition_id).await?;
  repo.link_work_edition(&work.work_id, translation_edition_id).await?;
  repo
    .link_edition_translates(translation_edition_id, source_edition_id)
    .await?;

  let pairs = stanza.lines.iter().zip(TRANSLATION_LINES);
  let mut aligned = 0;
  for ((source_text, target_text), line) in pairs.zip(1u32..) {
    let reference = aligned_ref(stanza, line);
    let source_segment = segment(source_edition_id, stanza, line, source_text, &reference);
    let target_segment =
      segment(translation_edition_id, stanza, line, target_text, &reference);

    repo.upsert_segment(&source_segment).await?;
    repo.upsert_segment(&target_segment).await?;
    repo
      .link_edition_segment(source_edition_id, &source_segment.segment_id)
      .await?;
    repo
      .link_edition_segment(translation_edition_id, &target_segment.segment_id)
      .await?;
    repo
      .link_segment_aligned_to(
        &target_segment.segment_id,
        &source_segment.segment_id,
        ALIGNMENT_METHOD,
        1.0,
      )
      .await?;
    aligned += 1;
  }

  info!(
    translation = translation_edition_id,
    source = source_edition_id,
    aligned,
    "alignment demo written"
  );
  Ok(aligned)
}

fn segment(
  edition_id: &str,
  stanza: &Stanza,
  line: u32,
  text: &str,
  reference: &str,
) -> Segment {
  Segment {
    segment_id: aligned_segment_id(edition_id, stanza, line),
    edition_id: edition_id.to_owned(),
    text:       text.to_owned(),
    position:   line,
    reference:  Some(reference.to_owned()),
    verse:      Some(stanza.verse.clone()),
    strophe:    Some(stanza.strophe.clone()),
    line:       Some(line.to_string()),
  }
}
