//! `report-inflections` and `report-repeated`: run the report queries and
//! render rows as `key=value | key=value` lines.

use std::fmt::{self, Write as _};

use nta_core::{
  report::{
    Attestation, FeatureCount, InflectionQuery, SourceSurfaceCount, SurfaceCount,
    WordCount,
  },
  store::ReportStore,
};

/// Rows that can be printed as `key=value` pairs.
pub trait Row {
  fn fields(&self) -> Vec<(&'static str, String)>;
}

fn year(value: Option<i32>) -> String {
  value.map_or_else(|| "None".to_owned(), |y| y.to_string())
}

impl Row for SurfaceCount {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![("surface", self.surface.clone()), ("freq", self.freq.to_string())]
  }
}

impl Row for SourceSurfaceCount {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("source_label", self.source_label.clone()),
      ("date_start", year(self.date_start)),
      ("date_end", year(self.date_end)),
      ("surface", self.surface.clone()),
      ("freq", self.freq.to_string()),
    ]
  }
}

impl Row for FeatureCount {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("case", self.case.clone()),
      ("number", self.number.clone()),
      ("gender", self.gender.clone()),
      ("freq", self.freq.to_string()),
    ]
  }
}

impl Row for Attestation {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![
      ("source_label", self.source_label.clone()),
      ("date_start", year(self.date_start)),
      ("date_end", year(self.date_end)),
      ("segment_ref", self.segment_ref.clone().unwrap_or_else(|| "None".into())),
      ("surface", self.surface.clone()),
      ("segment_text", self.segment_text.clone()),
    ]
  }
}

impl Row for WordCount {
  fn fields(&self) -> Vec<(&'static str, String)> {
    vec![("word", self.word.clone()), ("count", self.count.to_string())]
  }
}

/// `== title ==` followed by one line per row, or `(no rows)`.
pub fn section<R: Row>(out: &mut String, title: &str, rows: &[R]) -> fmt::Result {
  writeln!(out, "\n== {title} ==")?;
  if rows.is_empty() {
    return writeln!(out, "(no rows)");
  }
  for row in rows {
    let line = row
      .fields()
      .into_iter()
      .map(|(key, value)| format!("{key}={value}"))
      .collect::<Vec<_>>()
      .join(" | ");
    writeln!(out, "{line}")?;
  }
  Ok(())
}

/// Top surfaces (by source when the query has no year bounds), feature
/// counts and example attestations for one lemma.
pub async fn inflection_report<R: ReportStore>(
  store: &R,
  query: &InflectionQuery,
) -> anyhow::Result<String> {
  let mut out = String::new();
  writeln!(out, "lemma_id={}", query.lemma_id)?;
  writeln!(
    out,
    "filters=from_year={},to_year={},source_like={},limit={}",
    year(query.from_year),
    year(query.to_year),
    query.source_like.as_deref().unwrap_or("None"),
    query.limit,
  )?;

  if query.has_year_bounds() {
    let rows = store.top_surfaces(query).await?;
    section(&mut out, "Top observed surfaces", &rows)?;
  } else {
    let rows = store.top_surfaces_by_source(query).await?;
    section(&mut out, "Top surfaces by source/date fallback", &rows)?;
  }

  let features = store.feature_counts(query).await?;
  section(&mut out, "Morph feature counts (case/number/gender)", &features)?;

  let examples = store.example_attestations(query).await?;
  section(&mut out, "Example attestations", &examples)?;

  Ok(out)
}

pub async fn repeated_report<R: ReportStore>(
  store: &R,
  edition_id: &str,
  min_count: u64,
) -> anyhow::Result<String> {
  let rows = store.repeated_words(edition_id, min_count).await?;
  let mut out = String::new();
  writeln!(out, "edition_id={edition_id}")?;
  section(&mut out, &format!("Words occurring at least {min_count} times"), &rows)?;
  Ok(out)
}
