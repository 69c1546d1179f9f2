//! [`ReportStore`] over the `token_context` and `analysis_features` views.
//!
//! Every inflection query binds the same five parameters: `?1` lemma node key,
//! `?2` from-year, `?3` to-year, `?4` source-label substring, `?5` row limit.

use std::collections::BTreeMap;

use nta_core::{
  graph::{NodeKind, NodeRef},
  report::{
    Attestation, FeatureCount, InflectionQuery, SourceSurfaceCount, SurfaceCount,
    WordCount,
  },
  store::ReportStore,
};

use crate::{encode::NodeId, store::SqliteStore, Error, Result};

/// Tokens whose surface form realizes the lemma, with their context as `tc`.
macro_rules! lemma_tokens {
  () => {
    "FROM edges r
     JOIN edges io ON io.rel_type = 'INSTANCE_OF_FORM'
                  AND io.src_label = 'Token'
                  AND io.dst_label = 'Form' AND io.dst_key = r.src_key
     JOIN token_context tc ON tc.token_key = io.src_key
     WHERE r.rel_type = 'REALIZES'
       AND r.src_label = 'Form'
       AND r.dst_label = 'Lemma' AND r.dst_key = ?1"
  };
}

/// Editions overlapping `[?2, ?3]`; an open bound matches everything.
macro_rules! year_filter {
  () => {
    " AND (?2 IS NULL OR COALESCE(tc.date_end, tc.date_start, 999999) >= ?2)
      AND (?3 IS NULL OR COALESCE(tc.date_start, tc.date_end, -999999) <= ?3)"
  };
}

macro_rules! source_filter {
  () => {
    " AND (?4 IS NULL OR instr(lower(COALESCE(tc.source_label, '')), lower(?4)) > 0)"
  };
}

const TOP_SURFACES: &str = concat!(
  "SELECT tc.surface, COUNT(*) AS freq ",
  lemma_tokens!(),
  year_filter!(),
  source_filter!(),
  " GROUP BY tc.surface
    ORDER BY freq DESC, tc.surface ASC
    LIMIT ?5"
);

const TOP_SURFACES_BY_SOURCE: &str = concat!(
  "SELECT COALESCE(tc.source_label, '(unknown source)') AS source_label,
          tc.date_start, tc.date_end, tc.surface, COUNT(*) AS freq ",
  lemma_tokens!(),
  source_filter!(),
  " GROUP BY tc.source_label, tc.date_start, tc.date_end, tc.surface
    ORDER BY source_label ASC, freq DESC, tc.surface ASC
    LIMIT ?5"
);

const FEATURE_COUNTS: &str = concat!(
  "SELECT COALESCE(fcase.feature_value, 'NA') AS case_value,
          COALESCE(fnum.feature_value, 'NA') AS number_value,
          COALESCE(fgen.feature_value, 'NA') AS gender_value,
          COUNT(*) AS freq
   FROM edges aa
   JOIN edges ha ON ha.rel_type = 'HAS_ANALYSIS'
                AND ha.src_label = 'Token'
                AND ha.dst_label = 'MorphAnalysis' AND ha.dst_key = aa.src_key
   JOIN token_context tc ON tc.token_key = ha.src_key
   LEFT JOIN analysis_features fcase ON fcase.analysis_key = aa.src_key AND fcase.feature_key = 'case'
   LEFT JOIN analysis_features fnum ON fnum.analysis_key = aa.src_key AND fnum.feature_key = 'number'
   LEFT JOIN analysis_features fgen ON fgen.analysis_key = aa.src_key AND fgen.feature_key = 'gender'
   WHERE aa.rel_type = 'ANALYZES_AS'
     AND aa.src_label = 'MorphAnalysis'
     AND aa.dst_label = 'Lemma' AND aa.dst_key = ?1",
  year_filter!(),
  source_filter!(),
  " GROUP BY case_value, number_value, gender_value
    ORDER BY freq DESC, case_value, number_value, gender_value
    LIMIT ?5"
);

const EXAMPLE_ATTESTATIONS: &str = concat!(
  "SELECT COALESCE(tc.source_label, '(unknown source)') AS source_label,
          tc.date_start, tc.date_end, tc.segment_ref, tc.surface, tc.segment_text ",
  lemma_tokens!(),
  year_filter!(),
  source_filter!(),
  " ORDER BY COALESCE(tc.date_start, 999999), source_label, tc.segment_ref, tc.token_position
    LIMIT ?5"
);

const EDITION_WORDS: &str = "
SELECT COALESCE(tc.normalized, tc.surface) AS word, COUNT(*) AS n
FROM token_context tc
WHERE tc.edition_id = ?1
GROUP BY word";

/// Bindings shared by every inflection query.
struct Bindings {
  lemma_key:   String,
  from_year:   Option<i32>,
  to_year:     Option<i32>,
  source_like: Option<String>,
  limit:       u32,
}

impl Bindings {
  fn of(query: &InflectionQuery) -> Self {
    Self {
      lemma_key:   NodeId::of(&NodeRef::of(NodeKind::Lemma, &query.lemma_id)).key,
      from_year:   query.from_year,
      to_year:     query.to_year,
      source_like: query.source_like.clone().filter(|s| !s.is_empty()),
      limit:       query.limit,
    }
  }
}

macro_rules! bind {
  ($b:expr) => {
    rusqlite::params![$b.lemma_key, $b.from_year, $b.to_year, $b.source_like, $b.limit]
  };
}

fn freq(raw: i64) -> u64 { raw.max(0) as u64 }

// ─── ReportStore impl ────────────────────────────────────────────────────────

impl ReportStore for SqliteStore {
  type Error = Error;

  async fn top_surfaces(&self, query: &InflectionQuery) -> Result<Vec<SurfaceCount>> {
    let b = Bindings::of(query);
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(TOP_SURFACES)?;
        let rows = stmt
          .query_map(bind!(b), |row| {
            Ok(SurfaceCount {
              surface: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
              freq:    freq(row.get(1)?),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn top_surfaces_by_source(
    &self,
    query: &InflectionQuery,
  ) -> Result<Vec<SourceSurfaceCount>> {
    let b = Bindings::of(query);
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(TOP_SURFACES_BY_SOURCE)?;
        let rows = stmt
          .query_map(bind!(b), |row| {
            Ok(SourceSurfaceCount {
              source_label: row.get(0)?,
              date_start:   row.get(1)?,
              date_end:     row.get(2)?,
              surface:      row.get::<_, Option<String>>(3)?.unwrap_or_default(),
              freq:         freq(row.get(4)?),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn feature_counts(&self, query: &InflectionQuery) -> Result<Vec<FeatureCount>> {
    let b = Bindings::of(query);
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(FEATURE_COUNTS)?;
        let rows = stmt
          .query_map(bind!(b), |row| {
            Ok(FeatureCount {
              case:   row.get(0)?,
              number: row.get(1)?,
              gender: row.get(2)?,
              freq:   freq(row.get(3)?),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn example_attestations(
    &self,
    query: &InflectionQuery,
  ) -> Result<Vec<Attestation>> {
    let b = Bindings::of(query);
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(EXAMPLE_ATTESTATIONS)?;
        let rows = stmt
          .query_map(bind!(b), |row| {
            Ok(Attestation {
              source_label: row.get(0)?,
              date_start:   row.get(1)?,
              date_end:     row.get(2)?,
              segment_ref:  row.get(3)?,
              surface:      row.get::<_, Option<String>>(4)?.unwrap_or_default(),
              segment_text: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Words are case-folded here rather than in SQL, whose `lower()` only
  /// knows ASCII.
  async fn repeated_words(&self, edition_id: &str, min_count: u64) -> Result<Vec<WordCount>> {
    let edition_id = edition_id.to_owned();
    let raw: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(EDITION_WORDS)?;
        let rows = stmt
          .query_map(rusqlite::params![edition_id], |row| {
            Ok((row.get::<_, Option<String>>(0)?.unwrap_or_default(), row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut folded: BTreeMap<String, u64> = BTreeMap::new();
    for (word, n) in raw {
      if word.is_empty() {
        continue;
      }
      *folded.entry(word.to_lowercase()).or_default() += freq(n);
    }

    let mut counts: Vec<WordCount> = folded
      .into_iter()
      .filter(|(_, count)| *count >= min_count)
      .map(|(word, count)| WordCount { word, count })
      .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    Ok(counts)
  }
}
