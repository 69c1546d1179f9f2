//! Persist one [`AdapterOutput`] through the [`Repository`].
//!
//! Writes go out one at a time in document order: work, edition, then each
//! segment followed by its tokens. The first repository error aborts the run;
//! whatever was written before it stays, and re-running the same output
//! converges on the same graph.

use tracing::{debug, info};

use crate::{
  adapter::{AdapterOutput, SegmentRecord, TokenRecord, non_empty},
  analysis::MorphAnalyzer,
  ids,
  model::{Edition, Form, Lemma, MorphAnalysis, Segment, Token, UNKNOWN_POS, Work},
  repo::Repository,
  store::GraphStore,
  Result,
};

/// Language recorded on forms when the adapter gives none.
pub const DEFAULT_LANGUAGE: &str = "UNKNOWN";

/// Policy recorded on `NORMALIZED_TO` edges when the adapter gives none.
pub const DEFAULT_NORMALIZATION_POLICY: &str = "adapter";

/// `ORTHOGRAPHIC_VARIANT_OF.type` for adapter-supplied normalizations.
pub const ADAPTER_NORMALIZATION: &str = "adapter_normalization";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
  pub segments: u64,
  pub tokens:   u64,
}

/// Drives a [`Repository`] over adapter output.
///
/// Morphological analysis and identity lemmas are off unless requested.
pub struct Ingestor<'r, 's, S> {
  repo:            &'r Repository<'s, S>,
  analyzer:        Option<&'r dyn MorphAnalyzer>,
  identity_lemmas: bool,
}

/// Values resolved once per source and shared by every token.
struct EditionContext<'a> {
  language: &'a str,
  policy:   &'a str,
}

impl<'r, 's, S: GraphStore> Ingestor<'r, 's, S> {
  pub fn new(repo: &'r Repository<'s, S>) -> Self {
    Self { repo, analyzer: None, identity_lemmas: false }
  }

  /// Record one analysis per token from `analyzer`.
  pub fn with_analyzer(mut self, analyzer: &'r dyn MorphAnalyzer) -> Self {
    self.analyzer = Some(analyzer);
    self
  }

  /// Realize every form as a lemma keyed by its normalized spelling. A
  /// stand-in until real lemmatization exists.
  pub fn with_identity_lemmas(mut self) -> Self {
    self.identity_lemmas = true;
    self
  }

  pub async fn ingest(&self, output: &AdapterOutput) -> Result<IngestStats> {
    let edition = self.ingest_header(output).await?;

    let meta = &output.edition;
    let context = EditionContext {
      language: non_empty(meta.language.as_deref()).unwrap_or(DEFAULT_LANGUAGE),
      policy:   non_empty(meta.normalization_policy.as_deref())
        .unwrap_or(DEFAULT_NORMALIZATION_POLICY),
    };

    if let Some(analyzer) = self.analyzer {
      self.repo.upsert_analyzer(&analyzer.descriptor()).await?;
    }

    let mut stats = IngestStats::default();
    for record in &output.segments {
      let segment_id = self.ingest_segment(&edition, record).await?;
      stats.segments += 1;

      for token in &record.tokens {
        self.ingest_token(&segment_id, token, &context).await?;
        stats.tokens += 1;
      }
      debug!(
        segment_id = %segment_id,
        tokens = record.tokens.len(),
        "segment ingested"
      );
    }

    info!(
      work_id = %output.work.work_id,
      edition_id = %edition.edition_id,
      segments = stats.segments,
      tokens = stats.tokens,
      "ingestion complete"
    );
    Ok(stats)
  }

  async fn ingest_header(&self, output: &AdapterOutput) -> Result<Edition> {
    let work = Work {
      work_id: output.work.work_id.clone(),
      title:   output.work.title.clone(),
    };

    let meta = &output.edition;
    let mut edition = Edition::new(meta.edition_id.clone(), work.work_id.clone());
    edition.label = Some(
      non_empty(meta.source_label.as_deref())
        .unwrap_or(&meta.title)
        .to_owned(),
    );
    edition.version = meta.version.clone();
    edition.source_label = meta.source_label.clone();
    edition.language = meta.language.clone();
    edition.language_stage = meta.language_stage.clone();
    edition.date_start = meta.date_start;
    edition.date_end = meta.date_end;
    edition.normalization_policy = meta.normalization_policy.clone();
    edition.segment_mode = meta.segment_mode.clone();

    self.repo.upsert_work(&work).await?;
    self.repo.upsert_edition(&edition).await?;
    self
      .repo
      .link_work_edition(&work.work_id, &edition.edition_id)
      .await?;
    Ok(edition)
  }

  async fn ingest_segment(
    &self,
    edition: &Edition,
    record: &SegmentRecord,
  ) -> Result<String> {
    let segment_id = match non_empty(record.segment_id.as_deref()) {
      Some(id) => id.to_owned(),
      None => ids::segment_id(&edition.edition_id, record.ordinal),
    };
    let reference = match non_empty(record.reference.as_deref()) {
      Some(reference) => reference.to_owned(),
      None => record.ordinal.to_string(),
    };

    let segment = Segment {
      segment_id: segment_id.clone(),
      edition_id: edition.edition_id.clone(),
      text:       record.text.clone(),
      position:   record.ordinal,
      reference:  Some(reference),
      verse:      record.verse.clone(),
      strophe:    record.strophe.clone(),
      line:       record.line.clone(),
    };
    self.repo.upsert_segment(&segment).await?;
    self
      .repo
      .link_edition_segment(&edition.edition_id, &segment_id)
      .await?;
    Ok(segment_id)
  }

  async fn ingest_token(
    &self,
    segment_id: &str,
    record: &TokenRecord,
    context: &EditionContext<'_>,
  ) -> Result<()> {
    let token_id = match non_empty(record.token_id.as_deref()) {
      Some(id) => id.to_owned(),
      None => ids::token_id(segment_id, record.position),
    };
    let normalized = non_empty(record.normalized.as_deref())
      .unwrap_or(&record.surface)
      .to_owned();

    let token = Token {
      token_id:   token_id.clone(),
      segment_id: segment_id.to_owned(),
      surface:    record.surface.clone(),
      position:   record.position,
      normalized: Some(normalized.clone()),
      char_start: record.char_start,
      char_end:   record.char_end,
    };
    let surface_form = form(context.language, &record.surface);

    self.repo.upsert_token_and_form(&token, &surface_form).await?;
    self.repo.link_segment_token(segment_id, &token_id).await?;

    if normalized != record.surface {
      let normalized_form = form(context.language, &normalized);
      self.repo.upsert_form(&normalized_form).await?;
      self
        .repo
        .link_form_orthographic_variant(
          &surface_form.form_id,
          &normalized_form.form_id,
          ADAPTER_NORMALIZATION,
        )
        .await?;
      self
        .repo
        .link_token_normalized_to(&token_id, &normalized_form.form_id, context.policy)
        .await?;
    }

    if self.identity_lemmas {
      let lemma = Lemma {
        lemma_id: ids::lemma_id(context.language, &normalized),
        headword: normalized.clone(),
        language: context.language.to_owned(),
        pos:      Some(UNKNOWN_POS.to_owned()),
      };
      self.repo.upsert_lemma(&lemma).await?;
      self
        .repo
        .link_form_lemma(&surface_form.form_id, &lemma.lemma_id)
        .await?;
    }

    if let Some(analyzer) = self.analyzer {
      self.analyze_token(analyzer, &token).await?;
    }
    Ok(())
  }

  async fn analyze_token(&self, analyzer: &dyn MorphAnalyzer, token: &Token) -> Result<()> {
    let output = analyzer.analyze(token);
    let analyzer_id = analyzer.descriptor().analyzer_id;
    let analysis = MorphAnalysis {
      analysis_id:      ids::morph_analysis_id(
        &token.token_id,
        analyzer.name(),
        &ids::feature_key(&output.features),
      ),
      analyzer:         analyzer.name().to_owned(),
      confidence:       output.confidence,
      pos:              output.pos,
      is_ambiguous:     output.is_ambiguous,
      analyzer_version: Some(analyzer.version().to_owned()),
      created_at:       None,
      supersedes:       None,
      is_active:        true,
    };

    self.repo.upsert_morph_analysis(&analysis).await?;
    self
      .repo
      .link_token_analysis(&token.token_id, &analysis.analysis_id)
      .await?;
    self
      .repo
      .link_analysis_analyzer(&analysis.analysis_id, &analyzer_id)
      .await?;
    for (key, value) in &output.features {
      self
        .repo
        .link_analysis_feature(&analysis.analysis_id, key, value)
        .await?;
    }
    if let Some(lemma_id) = output.lemma_id.as_deref() {
      self
        .repo
        .link_analysis_lemma(&analysis.analysis_id, lemma_id)
        .await?;
    }
    Ok(())
  }
}

fn form(language: &str, orthography: &str) -> Form {
  Form {
    form_id:     ids::form_id(language, orthography),
    orthography: orthography.to_owned(),
    language:    language.to_owned(),
  }
}

/// Ingest with the base algorithm only.
pub async fn ingest_adapter_output<S: GraphStore>(
  repo: &Repository<'_, S>,
  output: &AdapterOutput,
) -> Result<IngestStats> {
  Ingestor::new(repo).ingest(output).await
}
