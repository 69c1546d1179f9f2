//! [`Repository`]: the only component that issues graph writes.
//!
//! Every method builds one [`Statement`] and hands it to the store. Upserts
//! match-or-create the node by its identity key and then overwrite its other
//! properties (last writer wins). Links match-or-create both endpoints by key
//! only, then match-or-create a single edge of the given type; edge properties,
//! when given, are overwritten. Each call is independently idempotent, so a
//! failed ingestion can simply be re-run.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::{
  graph::{schema_statements, NodeKind, NodeRef, Props, RelType, Statement},
  model::{
    Analyzer, Claim, Edition, Feature, Form, Lemma, MorphAnalysis, Segment, Source,
    Token, Work,
  },
  store::GraphStore,
  Error, Result,
};

/// Lemma-to-lemma history edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LemmaRelation {
  DerivesFrom,
  BorrowedFrom,
}

impl From<LemmaRelation> for RelType {
  fn from(relation: LemmaRelation) -> Self {
    match relation {
      LemmaRelation::DerivesFrom => RelType::DerivesFrom,
      LemmaRelation::BorrowedFrom => RelType::BorrowedFrom,
    }
  }
}

/// Node kinds a claim may assert about without a runtime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimTarget {
  Lemma,
  Etymon,
}

impl From<ClaimTarget> for NodeKind {
  fn from(target: ClaimTarget) -> Self {
    match target {
      ClaimTarget::Lemma => NodeKind::Lemma,
      ClaimTarget::Etymon => NodeKind::Etymon,
    }
  }
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// Borrows an already-open store; pooling and connection lifetime belong to
/// the caller.
pub struct Repository<'s, S> {
  store:    &'s S,
  deadline: Option<Duration>,
}

impl<'s, S: GraphStore> Repository<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store, deadline: None } }

  /// Bound every store call; an expired call fails with [`Error::Timeout`]
  /// even if the store goes on to commit it.
  pub fn with_deadline(mut self, deadline: Duration) -> Self {
    self.deadline = Some(deadline);
    self
  }

  pub fn store(&self) -> &'s S { self.store }

  async fn execute(&self, statement: Statement) -> Result<()> {
    if tracing::enabled!(tracing::Level::DEBUG) {
      let (cypher, params) = statement.to_cypher();
      debug!(%cypher, params = %serde_json::Value::Object(params), "graph write");
    }
    let call = self.store.run(statement);
    let outcome = match self.deadline {
      Some(deadline) => tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| Error::Timeout(deadline))?,
      None => call.await,
    };
    outcome.map_err(Error::store)
  }

  async fn link(
    &self,
    from: NodeRef,
    rel: RelType,
    to: NodeRef,
    props: Props,
  ) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("a", from)
          .merge("b", to)
          .relate("r", "a", rel, "b")
          .set("r", props),
      )
      .await
  }

  // ── Schema ────────────────────────────────────────────────────────────────

  /// Execute each statement of `definition` in order. The first failure
  /// aborts; statements already applied stay applied.
  pub async fn apply_schema(&self, definition: &str) -> Result<usize> {
    let statements = schema_statements(definition);
    let count = statements.len();
    for statement in statements {
      debug!(%statement, "schema statement");
      let call = self.store.execute_schema(statement);
      let outcome = match self.deadline {
        Some(deadline) => tokio::time::timeout(deadline, call)
          .await
          .map_err(|_| Error::Timeout(deadline))?,
        None => call.await,
      };
      outcome.map_err(Error::store)?;
    }
    Ok(count)
  }

  // ── Upserts ───────────────────────────────────────────────────────────────

  pub async fn upsert_work(&self, work: &Work) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("w", NodeRef::of(NodeKind::Work, &work.work_id))
          .set("w", Props::new().with("title", work.title.as_str())),
      )
      .await
  }

  pub async fn upsert_edition(&self, edition: &Edition) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("e", NodeRef::of(NodeKind::Edition, &edition.edition_id))
          .set(
            "e",
            Props::new()
              .with("label", edition.label.as_deref())
              .with("version", edition.version.as_deref())
              .with("source_label", edition.source_label.as_deref())
              .with("language", edition.language.as_deref())
              .with("language_stage", edition.language_stage.as_deref())
              .with("date_start", edition.date_start)
              .with("date_end", edition.date_end)
              .with("normalization_policy", edition.normalization_policy.as_deref())
              .with("segment_mode", edition.segment_mode.as_deref()),
          ),
      )
      .await
  }

  pub async fn upsert_segment(&self, segment: &Segment) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("s", NodeRef::of(NodeKind::Segment, &segment.segment_id))
          .set(
            "s",
            Props::new()
              .with("text", segment.text.as_str())
              .with("position", segment.position)
              .with("ref", segment.reference.as_deref())
              .with("verse", segment.verse.as_deref())
              .with("strophe", segment.strophe.as_deref())
              .with("line", segment.line.as_deref()),
          ),
      )
      .await
  }

  pub async fn upsert_form(&self, form: &Form) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("f", NodeRef::of(NodeKind::Form, &form.form_id))
          .set("f", form_props(form)),
      )
      .await
  }

  /// Token, its surface form and the `INSTANCE_OF_FORM` edge in one write.
  pub async fn upsert_token_and_form(&self, token: &Token, form: &Form) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("t", NodeRef::of(NodeKind::Token, &token.token_id))
          .set(
            "t",
            Props::new()
              .with("surface", token.surface.as_str())
              .with("position", token.position)
              .with("normalized", token.normalized.as_deref())
              .with("char_start", token.char_start)
              .with("char_end", token.char_end),
          )
          .merge("f", NodeRef::of(NodeKind::Form, &form.form_id))
          .set("f", form_props(form))
          .relate("r", "t", RelType::InstanceOfForm, "f"),
      )
      .await
  }

  pub async fn upsert_lemma(&self, lemma: &Lemma) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("l", NodeRef::of(NodeKind::Lemma, &lemma.lemma_id))
          .set(
            "l",
            Props::new()
              .with("headword", lemma.headword.as_str())
              .with("language", lemma.language.as_str())
              .with("pos", lemma.pos.as_deref()),
          ),
      )
      .await
  }

  /// `created_at` is stamped only when the analysis is first created.
  pub async fn upsert_morph_analysis(&self, analysis: &MorphAnalysis) -> Result<()> {
    let created_at = analysis.created_at.unwrap_or_else(Utc::now).to_rfc3339();
    self
      .execute(
        Statement::new()
          .merge("m", NodeRef::of(NodeKind::MorphAnalysis, &analysis.analysis_id))
          .on_create("m", Props::new().with("created_at", created_at))
          .set(
            "m",
            Props::new()
              .with("analyzer", analysis.analyzer.as_str())
              .with("analyzer_version", analysis.analyzer_version.as_deref())
              .with("confidence", analysis.confidence)
              .with("pos", analysis.pos.as_str())
              .with("is_ambiguous", analysis.is_ambiguous)
              .with("supersedes", analysis.supersedes.as_deref())
              .with("is_active", analysis.is_active),
          ),
      )
      .await
  }

  /// Record `replacement` as the active analysis and retire `old_id`. The old
  /// analysis is kept with `is_active = false`.
  pub async fn supersede_analysis(
    &self,
    old_id: &str,
    replacement: &MorphAnalysis,
  ) -> Result<()> {
    self.upsert_morph_analysis(replacement).await?;
    self
      .execute(
        Statement::new()
          .merge("new", NodeRef::of(NodeKind::MorphAnalysis, &replacement.analysis_id))
          .set(
            "new",
            Props::new().with("supersedes", old_id).with("is_active", true),
          )
          .merge("old", NodeRef::of(NodeKind::MorphAnalysis, old_id))
          .set("old", Props::new().with("is_active", false)),
      )
      .await
  }

  pub async fn upsert_feature(&self, feature: &Feature) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("f", NodeRef::feature(&feature.key, &feature.value))
          .set(
            "f",
            Props::new().with("lemma_guess", feature.lemma_guess.as_deref()),
          ),
      )
      .await
  }

  /// `created_at` is stamped only when the analyzer is first created.
  pub async fn upsert_analyzer(&self, analyzer: &Analyzer) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("a", NodeRef::of(NodeKind::Analyzer, &analyzer.analyzer_id))
          .on_create("a", Props::new().with("created_at", Utc::now().to_rfc3339()))
          .set(
            "a",
            Props::new()
              .with("name", analyzer.name.as_str())
              .with("version", analyzer.version.as_str())
              .with("description", analyzer.description.as_deref())
              .with("author", analyzer.author.as_deref()),
          ),
      )
      .await
  }

  pub async fn upsert_claim(&self, claim: &Claim) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("c", NodeRef::of(NodeKind::Claim, &claim.claim_id))
          .set(
            "c",
            Props::new()
              .with("type", claim.claim_type.as_str())
              .with("statement", claim.statement.as_str())
              .with("confidence", claim.confidence)
              .with("status", claim.status.as_deref()),
          ),
      )
      .await
  }

  pub async fn upsert_source(&self, source: &Source) -> Result<()> {
    self
      .execute(
        Statement::new()
          .merge("s", NodeRef::of(NodeKind::Source, &source.source_id))
          .set(
            "s",
            Props::new()
              .with("citekey", source.citekey.as_str())
              .with("title", source.title.as_str())
              .with("year", source.year)
              .with("authors", source.authors.clone())
              .with("url", source.url.as_deref()),
          ),
      )
      .await
  }

  // ── Text hierarchy links ──────────────────────────────────────────────────

  pub async fn link_work_edition(&self, work_id: &str, edition_id: &str) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Work, work_id),
        RelType::HasEdition,
        NodeRef::of(NodeKind::Edition, edition_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_edition_translates(
    &self,
    translation_edition_id: &str,
    source_edition_id: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Edition, translation_edition_id),
        RelType::Translates,
        NodeRef::of(NodeKind::Edition, source_edition_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_edition_segment(
    &self,
    edition_id: &str,
    segment_id: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Edition, edition_id),
        RelType::HasSegment,
        NodeRef::of(NodeKind::Segment, segment_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_segment_token(&self, segment_id: &str, token_id: &str) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Segment, segment_id),
        RelType::HasToken,
        NodeRef::of(NodeKind::Token, token_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_segment_aligned_to(
    &self,
    segment_id: &str,
    aligned_segment_id: &str,
    method: &str,
    confidence: f64,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Segment, segment_id),
        RelType::AlignedTo,
        NodeRef::of(NodeKind::Segment, aligned_segment_id),
        Props::new()
          .with("method", method)
          .with("confidence", confidence),
      )
      .await
  }

  // ── Lexical links ─────────────────────────────────────────────────────────

  pub async fn link_token_form(&self, token_id: &str, form_id: &str) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Token, token_id),
        RelType::InstanceOfForm,
        NodeRef::of(NodeKind::Form, form_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_token_normalized_to(
    &self,
    token_id: &str,
    form_id: &str,
    policy: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Token, token_id),
        RelType::NormalizedTo,
        NodeRef::of(NodeKind::Form, form_id),
        Props::new().with("policy", policy),
      )
      .await
  }

  pub async fn link_form_orthographic_variant(
    &self,
    form_id: &str,
    normalized_form_id: &str,
    variant_type: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Form, form_id),
        RelType::OrthographicVariantOf,
        NodeRef::of(NodeKind::Form, normalized_form_id),
        Props::new().with("type", variant_type),
      )
      .await
  }

  pub async fn link_form_lemma(&self, form_id: &str, lemma_id: &str) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Form, form_id),
        RelType::Realizes,
        NodeRef::of(NodeKind::Lemma, lemma_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_lemma_history(
    &self,
    from_lemma_id: &str,
    relation: LemmaRelation,
    to_lemma_id: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Lemma, from_lemma_id),
        relation.into(),
        NodeRef::of(NodeKind::Lemma, to_lemma_id),
        Props::new(),
      )
      .await
  }

  // ── Morphology links ──────────────────────────────────────────────────────

  pub async fn link_token_analysis(&self, token_id: &str, analysis_id: &str) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Token, token_id),
        RelType::HasAnalysis,
        NodeRef::of(NodeKind::MorphAnalysis, analysis_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_analysis_feature(
    &self,
    analysis_id: &str,
    key: &str,
    value: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::MorphAnalysis, analysis_id),
        RelType::HasFeature,
        NodeRef::feature(key, value),
        Props::new(),
      )
      .await
  }

  pub async fn link_analysis_lemma(&self, analysis_id: &str, lemma_id: &str) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::MorphAnalysis, analysis_id),
        RelType::AnalyzesAs,
        NodeRef::of(NodeKind::Lemma, lemma_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_analysis_analyzer(
    &self,
    analysis_id: &str,
    analyzer_id: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::MorphAnalysis, analysis_id),
        RelType::ProducedBy,
        NodeRef::of(NodeKind::Analyzer, analyzer_id),
        Props::new(),
      )
      .await
  }

  // ── Claims ────────────────────────────────────────────────────────────────

  pub async fn link_claim_supported_by(&self, claim_id: &str, source_id: &str) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Claim, claim_id),
        RelType::SupportedBy,
        NodeRef::of(NodeKind::Source, source_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_claim_contradicts(
    &self,
    claim_id: &str,
    other_claim_id: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Claim, claim_id),
        RelType::Contradicts,
        NodeRef::of(NodeKind::Claim, other_claim_id),
        Props::new(),
      )
      .await
  }

  /// `ASSERTS` edge to a node whose label and identity field arrive as data.
  ///
  /// Both names must match `^[A-Za-z][A-Za-z0-9_]*$`; otherwise this fails
  /// with [`Error::UnsafeIdentifier`] and nothing reaches the store.
  pub async fn link_claim_asserts(
    &self,
    claim_id: &str,
    target_label: &str,
    target_id_field: &str,
    target_id: &str,
  ) -> Result<()> {
    let target = NodeRef::dynamic(target_label, target_id_field, target_id)?;
    self
      .link(
        NodeRef::of(NodeKind::Claim, claim_id),
        RelType::Asserts,
        target,
        Props::new(),
      )
      .await
  }

  pub async fn link_claim_asserts_target(
    &self,
    claim_id: &str,
    target: ClaimTarget,
    target_id: &str,
  ) -> Result<()> {
    self
      .link(
        NodeRef::of(NodeKind::Claim, claim_id),
        RelType::Asserts,
        NodeRef::of(target.into(), target_id),
        Props::new(),
      )
      .await
  }

  pub async fn link_claim_asserts_lemma(&self, claim_id: &str, lemma_id: &str) -> Result<()> {
    self
      .link_claim_asserts_target(claim_id, ClaimTarget::Lemma, lemma_id)
      .await
  }

  pub async fn link_claim_asserts_etymon(
    &self,
    claim_id: &str,
    etymon_id: &str,
  ) -> Result<()> {
    self
      .link_claim_asserts_target(claim_id, ClaimTarget::Etymon, etymon_id)
      .await
  }
}

fn form_props(form: &Form) -> Props {
  Props::new()
    .with("orthography", form.orthography.as_str())
    .with("language", form.language.as_str())
}
