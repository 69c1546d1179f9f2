//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone as _, Utc};
use nta_core::{
  adapter::{AdapterOutput, EditionMetadata, SegmentRecord, TokenRecord, WorkMetadata},
  config::GraphConfig,
  graph::{NodeKind, NodeRef, Props, RelType, Statement},
  ids,
  model::{Lemma, MorphAnalysis},
  pipeline::{Ingestor, ingest_adapter_output},
  report::InflectionQuery,
  repo::Repository,
  store::{GraphStore, ReportStore},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

const LANGUAGE: &str = "Old Norse";

fn token(surface: &str, normalized: &str, position: u32) -> TokenRecord {
  TokenRecord {
    surface: surface.into(),
    normalized: Some(normalized.into()),
    position,
    token_id: None,
    char_start: None,
    char_end: None,
  }
}

fn edition(
  edition_id: &str,
  source_label: &str,
  dates: Option<(i32, i32)>,
  segments: Vec<SegmentRecord>,
) -> AdapterOutput {
  AdapterOutput {
    work:     WorkMetadata { work_id: "havamal".into(), title: "Hávamál".into() },
    edition:  EditionMetadata {
      edition_id: edition_id.into(),
      title: edition_id.into(),
      source_label: Some(source_label.into()),
      language: Some(LANGUAGE.into()),
      date_start: dates.map(|d| d.0),
      date_end: dates.map(|d| d.1),
      ..EditionMetadata::default()
    },
    segments,
  }
}

/// Two segments, three tokens, one of which needs normalization.
fn poem() -> AdapterOutput {
  edition(
    "A",
    "Sæmundar-Edda",
    Some((900, 1100)),
    vec![
      SegmentRecord::new("gáttir allar", 1, vec![
        token("gáttir", "gáttir", 0),
        token("allar", "allar", 1),
      ]),
      SegmentRecord::new("Gáttir,", 2, vec![token("Gáttir,", "gáttir", 0)]),
    ],
  )
}

fn gattir() -> String { ids::lemma_id(LANGUAGE, "gáttir") }

// ─── Write semantics ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ingestion_is_idempotent() {
  let s = store().await;
  let repo = Repository::new(&s);

  let first = ingest_adapter_output(&repo, &poem()).await.unwrap();
  let nodes = s.count_nodes(None).await.unwrap();
  let edges = s.count_edges(None).await.unwrap();

  let second = ingest_adapter_output(&repo, &poem()).await.unwrap();
  assert_eq!(first, second);
  assert_eq!(first.segments, 2);
  assert_eq!(first.tokens, 3);
  assert_eq!(s.count_nodes(None).await.unwrap(), nodes);
  assert_eq!(s.count_edges(None).await.unwrap(), edges);

  assert_eq!(s.count_nodes(Some("Segment")).await.unwrap(), 2);
  assert_eq!(s.count_nodes(Some("Token")).await.unwrap(), 3);
  // gáttir, allar, Gáttir,
  assert_eq!(s.count_nodes(Some("Form")).await.unwrap(), 3);
  assert_eq!(s.count_edges(Some(RelType::HasToken)).await.unwrap(), 3);
  assert_eq!(s.count_edges(Some(RelType::NormalizedTo)).await.unwrap(), 1);
  assert_eq!(
    s.count_edges(Some(RelType::OrthographicVariantOf)).await.unwrap(),
    1
  );
}

#[tokio::test]
async fn fallback_ids_land_in_the_store() {
  let s = store().await;
  let repo = Repository::new(&s);
  ingest_adapter_output(&repo, &poem()).await.unwrap();

  let token = s
    .get_node(&NodeRef::of(NodeKind::Token, "A:segment:2:token:0"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(token["surface"], "Gáttir,");
  assert_eq!(token["normalized"], "gáttir");

  let segment = s
    .get_node(&NodeRef::of(NodeKind::Segment, "A:segment:2"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(segment["ref"], "2");
  assert_eq!(segment["segment_id"], "A:segment:2");

  let normalized_to = s
    .get_edge(
      &NodeRef::of(NodeKind::Token, "A:segment:2:token:0"),
      RelType::NormalizedTo,
      &NodeRef::of(NodeKind::Form, ids::form_id(LANGUAGE, "gáttir")),
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(normalized_to["policy"], "adapter");
}

#[tokio::test]
async fn upsert_overwrites_and_null_removes() {
  let s = store().await;
  let repo = Repository::new(&s);

  let mut lemma = Lemma {
    lemma_id: gattir(),
    headword: "gátt".into(),
    language: LANGUAGE.into(),
    pos:      Some("NOUN".into()),
  };
  repo.upsert_lemma(&lemma).await.unwrap();

  lemma.headword = "gáttir".into();
  lemma.pos = None;
  repo.upsert_lemma(&lemma).await.unwrap();

  let node = s
    .get_node(&NodeRef::of(NodeKind::Lemma, gattir()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(node["headword"], "gáttir");
  assert!(!node.contains_key("pos"));
  assert_eq!(s.count_nodes(Some("Lemma")).await.unwrap(), 1);
}

#[tokio::test]
async fn on_create_fields_survive_later_upserts() {
  let s = store().await;
  let repo = Repository::new(&s);

  let mut analysis = MorphAnalysis {
    analysis_id:      "morph:1".into(),
    analyzer:         "placeholder".into(),
    confidence:       0.0,
    pos:              "UNKNOWN".into(),
    is_ambiguous:     false,
    analyzer_version: Some("0.1".into()),
    created_at:       Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
    supersedes:       None,
    is_active:        true,
  };
  repo.upsert_morph_analysis(&analysis).await.unwrap();

  analysis.created_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
  analysis.pos = "NOUN".into();
  analysis.confidence = 0.75;
  repo.upsert_morph_analysis(&analysis).await.unwrap();

  let node = s
    .get_node(&NodeRef::of(NodeKind::MorphAnalysis, "morph:1"))
    .await
    .unwrap()
    .unwrap();
  assert!(node["created_at"].as_str().unwrap().starts_with("2024-01-01"));
  assert_eq!(node["pos"], "NOUN");
  assert_eq!(node["confidence"].as_f64(), Some(0.75));
  assert_eq!(node["is_active"], true);
}

#[tokio::test]
async fn reupserted_analysis_takes_the_latest_status() {
  let s = store().await;
  let repo = Repository::new(&s);

  let mut analysis = MorphAnalysis {
    analysis_id:      "morph:1".into(),
    analyzer:         "placeholder".into(),
    confidence:       0.0,
    pos:              "UNKNOWN".into(),
    is_ambiguous:     false,
    analyzer_version: None,
    created_at:       None,
    supersedes:       None,
    is_active:        true,
  };
  repo.upsert_morph_analysis(&analysis).await.unwrap();

  analysis.is_active = false;
  analysis.supersedes = Some("morph:0".into());
  repo.upsert_morph_analysis(&analysis).await.unwrap();

  let node = s
    .get_node(&NodeRef::of(NodeKind::MorphAnalysis, "morph:1"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(node["is_active"], false);
  assert_eq!(node["supersedes"], "morph:0");
  assert_eq!(s.count_nodes(Some("MorphAnalysis")).await.unwrap(), 1);
}

#[tokio::test]
async fn supersede_keeps_both_analyses() {
  let s = store().await;
  let repo = Repository::new(&s);

  let old = MorphAnalysis {
    analysis_id:      "morph:old".into(),
    analyzer:         "placeholder".into(),
    confidence:       0.0,
    pos:              "UNKNOWN".into(),
    is_ambiguous:     false,
    analyzer_version: None,
    created_at:       None,
    supersedes:       None,
    is_active:        true,
  };
  let new = MorphAnalysis {
    analysis_id: "morph:new".into(),
    analyzer: "tagger".into(),
    confidence: 0.9,
    pos: "NOUN".into(),
    ..old.clone()
  };
  repo.upsert_morph_analysis(&old).await.unwrap();
  repo.supersede_analysis("morph:old", &new).await.unwrap();

  let old_node = s
    .get_node(&NodeRef::of(NodeKind::MorphAnalysis, "morph:old"))
    .await
    .unwrap()
    .unwrap();
  let new_node = s
    .get_node(&NodeRef::of(NodeKind::MorphAnalysis, "morph:new"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(old_node["is_active"], false);
  assert_eq!(new_node["is_active"], true);
  assert_eq!(new_node["supersedes"], "morph:old");
}

#[tokio::test]
async fn edge_attributes_are_overwritten_not_duplicated() {
  let s = store().await;
  let repo = Repository::new(&s);

  repo
    .link_segment_aligned_to("en:1", "non:1", "auto", 0.5)
    .await
    .unwrap();
  repo
    .link_segment_aligned_to("en:1", "non:1", "manual", 1.0)
    .await
    .unwrap();

  assert_eq!(s.count_edges(Some(RelType::AlignedTo)).await.unwrap(), 1);
  let edge = s
    .get_edge(
      &NodeRef::of(NodeKind::Segment, "en:1"),
      RelType::AlignedTo,
      &NodeRef::of(NodeKind::Segment, "non:1"),
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(edge["method"], "manual");
  assert_eq!(edge["confidence"].as_f64(), Some(1.0));
}

#[tokio::test]
async fn dynamic_claim_target_creates_labelled_node() {
  let s = store().await;
  let repo = Repository::new(&s);

  repo
    .link_claim_asserts("claim:1", "Witness", "witness_id", "witness:r")
    .await
    .unwrap();
  repo.link_claim_asserts_lemma("claim:1", &gattir()).await.unwrap();

  assert_eq!(s.count_nodes(Some("Witness")).await.unwrap(), 1);
  assert_eq!(s.count_edges(Some(RelType::Asserts)).await.unwrap(), 2);

  let err = repo
    .link_claim_asserts("claim:1", "Witness;", "witness_id", "witness:r")
    .await
    .unwrap_err();
  assert!(matches!(err, nta_core::Error::UnsafeIdentifier(_)));
  assert_eq!(s.count_edges(Some(RelType::Asserts)).await.unwrap(), 2);
}

#[tokio::test]
async fn dynamic_claim_target_never_duplicates_a_known_kind() {
  let s = store().await;
  let repo = Repository::new(&s);

  repo
    .upsert_lemma(&Lemma {
      lemma_id: "lemma:x".into(),
      headword: "Nóregr".into(),
      language: "non".into(),
      pos:      None,
    })
    .await
    .unwrap();

  let err = repo
    .link_claim_asserts("claim:1", "Lemma", "headword", "Nóregr")
    .await
    .unwrap_err();
  assert!(matches!(err, nta_core::Error::InvalidConfig(_)));
  assert_eq!(s.count_nodes(Some("Lemma")).await.unwrap(), 1);
  assert_eq!(s.count_nodes(Some("Claim")).await.unwrap(), 0);

  repo
    .link_claim_asserts("claim:1", "Lemma", "lemma_id", "lemma:x")
    .await
    .unwrap();
  assert_eq!(s.count_nodes(Some("Lemma")).await.unwrap(), 1);
  assert_eq!(s.count_edges(Some(RelType::Asserts)).await.unwrap(), 1);
}

#[tokio::test]
async fn malformed_statement_writes_nothing() {
  let s = store().await;

  let statement = Statement::new()
    .merge("a", NodeRef::of(NodeKind::Token, "t1"))
    .set("a", Props::new().with("surface", "x"))
    .relate("r", "a", RelType::InstanceOfForm, "missing");
  let err = s.run(statement).await.unwrap_err();

  assert!(matches!(err, Error::UnboundVariable("missing")));
  assert_eq!(s.count_nodes(None).await.unwrap(), 0);
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn schema_is_reapplicable() {
  let s = store().await;
  let repo = Repository::new(&s);
  let definition = "
    -- lookups by identity property
    CREATE INDEX IF NOT EXISTS lemma_idx ON nodes(json_extract(props, '$.lemma_id'))
      WHERE label = 'Lemma';
    CREATE INDEX IF NOT EXISTS token_idx ON nodes(json_extract(props, '$.token_id'))
      WHERE label = 'Token';
  ";
  assert_eq!(repo.apply_schema(definition).await.unwrap(), 2);
  assert_eq!(repo.apply_schema(definition).await.unwrap(), 2);
}

#[tokio::test]
async fn schema_failure_propagates() {
  let s = store().await;
  let repo = Repository::new(&s);
  let err = repo
    .apply_schema("CREATE INDEX IF NOT EXISTS ok_idx ON nodes(label); NOT A STATEMENT")
    .await
    .unwrap_err();
  assert!(matches!(err, nta_core::Error::Store(_)));
}

// ─── Connection ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_checks_principal_credential() {
  let dir = tempfile::tempdir().unwrap();
  let uri = format!("sqlite://{}", dir.path().join("graph.db").display());

  let config = GraphConfig::new(&uri, "nta", Some("secret".into())).unwrap();
  SqliteStore::connect(&config).await.unwrap().close().await.unwrap();
  SqliteStore::connect(&config).await.unwrap().close().await.unwrap();

  let wrong = GraphConfig::new(&uri, "nta", Some("guess".into())).unwrap();
  let err = SqliteStore::connect(&wrong).await.err().unwrap();
  assert!(matches!(err, Error::AuthFailed(user) if user == "nta"));

  let other = GraphConfig::new(&uri, "reader", Some("guess".into())).unwrap();
  SqliteStore::connect(&other).await.unwrap();
}

#[tokio::test]
async fn connect_rejects_foreign_uris() {
  let config =
    GraphConfig::new("bolt://localhost:7687", "nta", Some("secret".into())).unwrap();
  let err = SqliteStore::connect(&config).await.err().unwrap();
  assert!(matches!(err, Error::UnsupportedUri(_)));

  let memory = GraphConfig::new("sqlite::memory:", "nta", Some("secret".into())).unwrap();
  assert!(SqliteStore::connect(&memory).await.is_ok());
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// `poem()` plus an undated translation, with identity lemmas.
async fn reporting_store() -> SqliteStore {
  let s = store().await;
  let repo = Repository::new(&s);
  let ingestor = Ingestor::new(&repo).with_identity_lemmas();
  ingestor.ingest(&poem()).await.unwrap();
  ingestor
    .ingest(&edition("B", "Bellows translation", None, vec![SegmentRecord::new(
      "gáttir",
      1,
      vec![token("gáttir", "gáttir", 0)],
    )]))
    .await
    .unwrap();
  s
}

#[tokio::test]
async fn top_surfaces_respects_year_bounds() {
  let s = reporting_store().await;

  let mut query = InflectionQuery::new(gattir());
  query.from_year = Some(800);
  query.source_like = Some("edda".into());
  let rows = s.top_surfaces(&query).await.unwrap();
  let rows: Vec<_> = rows.iter().map(|r| (r.surface.as_str(), r.freq)).collect();
  // Ties sort by surface in byte order, so capitals come first.
  assert_eq!(rows, vec![("Gáttir,", 1), ("gáttir", 1)]);

  query.from_year = Some(1200);
  assert!(s.top_surfaces(&query).await.unwrap().is_empty());

  // Undated editions are never excluded by a year bound.
  query.source_like = None;
  let rows = s.top_surfaces(&query).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].surface, "gáttir");
}

#[tokio::test]
async fn top_surfaces_by_source_groups_editions() {
  let s = reporting_store().await;

  let rows = s
    .top_surfaces_by_source(&InflectionQuery::new(gattir()))
    .await
    .unwrap();
  let rows: Vec<_> = rows
    .iter()
    .map(|r| (r.source_label.as_str(), r.surface.as_str(), r.freq))
    .collect();
  assert_eq!(rows, vec![
    ("Bellows translation", "gáttir", 1),
    ("Sæmundar-Edda", "Gáttir,", 1),
    ("Sæmundar-Edda", "gáttir", 1),
  ]);

  let mut query = InflectionQuery::new(gattir());
  query.source_like = Some("BELLOWS".into());
  assert_eq!(s.top_surfaces_by_source(&query).await.unwrap().len(), 1);
}

#[tokio::test]
async fn example_attestations_order_dated_sources_first() {
  let s = reporting_store().await;

  let rows = s
    .example_attestations(&InflectionQuery::new(gattir()))
    .await
    .unwrap();
  assert_eq!(rows.len(), 3);
  assert_eq!(rows[0].source_label, "Sæmundar-Edda");
  assert_eq!(rows[0].date_start, Some(900));
  assert_eq!(rows[0].segment_ref.as_deref(), Some("1"));
  assert_eq!(rows[0].segment_text, "gáttir allar");
  assert_eq!(rows[2].source_label, "Bellows translation");
  assert_eq!(rows[2].date_start, None);

  let mut query = InflectionQuery::new(gattir());
  query.limit = 1;
  assert_eq!(s.example_attestations(&query).await.unwrap().len(), 1);
}

#[tokio::test]
async fn feature_counts_fill_missing_features() {
  let s = reporting_store().await;
  let repo = Repository::new(&s);

  let analysis = MorphAnalysis {
    analysis_id:      "morph:g".into(),
    analyzer:         "manual".into(),
    confidence:       1.0,
    pos:              "NOUN".into(),
    is_ambiguous:     false,
    analyzer_version: None,
    created_at:       None,
    supersedes:       None,
    is_active:        true,
  };
  repo.upsert_morph_analysis(&analysis).await.unwrap();
  repo
    .link_token_analysis("A:segment:1:token:0", "morph:g")
    .await
    .unwrap();
  repo.link_analysis_lemma("morph:g", &gattir()).await.unwrap();
  repo.link_analysis_feature("morph:g", "case", "nom").await.unwrap();
  repo.link_analysis_feature("morph:g", "number", "pl").await.unwrap();

  let rows = s
    .feature_counts(&InflectionQuery::new(gattir()))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(
    (rows[0].case.as_str(), rows[0].number.as_str(), rows[0].gender.as_str()),
    ("nom", "pl", "NA")
  );
  assert_eq!(rows[0].freq, 1);
}

#[tokio::test]
async fn repeated_words_counts_normalized_forms() {
  let s = reporting_store().await;

  let rows = s.repeated_words("A", 2).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].word, "gáttir");
  assert_eq!(rows[0].count, 2);

  let all = s.repeated_words("A", 1).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(s.repeated_words("missing", 1).await.unwrap().is_empty());
}
