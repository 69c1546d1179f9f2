//! The `GraphStore` and `ReportStore` traits.
//!
//! Storage backends (e.g. `nta-store-sqlite`) implement these. The repository
//! and the ingestion pipeline depend only on the abstraction.

use std::future::Future;

use crate::{
  graph::Statement,
  report::{
    Attestation, FeatureCount, InflectionQuery, SourceSurfaceCount, SurfaceCount,
    WordCount,
  },
};

/// "Run a parameterized write against a graph" plus "apply a schema
/// statement". The caller owns the connection lifecycle; a store handle is
/// already open when it reaches the repository.
pub trait GraphStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Execute every clause of `statement` as one unit of work with
  /// match-or-create semantics for nodes and edges.
  fn run(
    &self,
    statement: Statement,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Execute one statement of a schema definition.
  fn execute_schema(
    &self,
    statement: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Read-only aggregation queries over a populated graph.
pub trait ReportStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Most frequent token surfaces realizing the lemma, for editions whose
  /// date range overlaps the query's.
  fn top_surfaces(
    &self,
    query: &InflectionQuery,
  ) -> impl Future<Output = Result<Vec<SurfaceCount>, Self::Error>> + Send;

  /// Surfaces grouped by source; used when the query has no year bounds.
  fn top_surfaces_by_source(
    &self,
    query: &InflectionQuery,
  ) -> impl Future<Output = Result<Vec<SourceSurfaceCount>, Self::Error>> + Send;

  /// Case / number / gender combinations among analyses of the lemma.
  fn feature_counts(
    &self,
    query: &InflectionQuery,
  ) -> impl Future<Output = Result<Vec<FeatureCount>, Self::Error>> + Send;

  fn example_attestations(
    &self,
    query: &InflectionQuery,
  ) -> impl Future<Output = Result<Vec<Attestation>, Self::Error>> + Send;

  /// Normalized words occurring at least `min_count` times in an edition.
  fn repeated_words(
    &self,
    edition_id: &str,
    min_count: u64,
  ) -> impl Future<Output = Result<Vec<WordCount>, Self::Error>> + Send;
}
