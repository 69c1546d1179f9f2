//! `ingest-json` and `ingest-plaintext`.

use std::path::Path;

use anyhow::Context as _;
use nta_adapters::{PlaintextAdapter, PlaintextConfig, PoemConfig, PoemJsonAdapter};
use nta_core::{
  analysis::PlaceholderAnalyzer,
  pipeline::{IngestStats, Ingestor},
  repo::Repository,
  store::GraphStore,
};
use tracing::info;

/// Poem JSON with one placeholder analysis per token.
pub async fn ingest_poem<S: GraphStore>(
  repo: &Repository<'_, S>,
  path: &Path,
  config: PoemConfig,
) -> anyhow::Result<IngestStats> {
  let output = PoemJsonAdapter::new(config)
    .adapt_path(path)
    .with_context(|| format!("failed to adapt {}", path.display()))?;

  let analyzer = PlaceholderAnalyzer;
  let stats = Ingestor::new(repo)
    .with_analyzer(&analyzer)
    .ingest(&output)
    .await
    .context("ingestion aborted")?;

  info!(
    path = %path.display(),
    edition = %output.edition.edition_id,
    segments = stats.segments,
    tokens = stats.tokens,
    "ingested poem"
  );
  Ok(stats)
}

/// Plain text; each form realizes an identity lemma so reports have data.
pub async fn ingest_plaintext<S: GraphStore>(
  repo: &Repository<'_, S>,
  path: &Path,
  config: PlaintextConfig,
) -> anyhow::Result<IngestStats> {
  let mode = config.mode;
  let output = PlaintextAdapter::new(config)
    .adapt_path(path)
    .with_context(|| format!("failed to adapt {}", path.display()))?;

  let stats = Ingestor::new(repo)
    .with_identity_lemmas()
    .ingest(&output)
    .await
    .context("ingestion aborted")?;

  info!(
    path = %path.display(),
    edition = %output.edition.edition_id,
    %mode,
    segments = stats.segments,
    tokens = stats.tokens,
    "ingested plain text"
  );
  Ok(stats)
}
