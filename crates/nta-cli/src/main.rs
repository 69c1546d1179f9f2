//! `nta`: command-line entry point for the Norse text graph.
//!
//! # Usage
//!
//! ```text
//! nta apply-schema
//! nta ingest-json --input data/Hávamál1.json
//! nta ingest-plaintext --path saga.txt --work-id heimskringla \
//!     --edition-id heimskringla_nb --source-label "Snorre" --language-stage nb
//! nta report-inflections --lemma-id "non:Nóregr" --from-year 900 --to-year 1300
//! ```
//!
//! Connection settings come from `nta.toml` and `NTA_*` environment
//! variables (see [`settings`]).

mod commands;
mod settings;


use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use commands::{
  DEFAULT_SCHEMA,
  align::{self, DEFAULT_SOURCE_EDITION, DEFAULT_TRANSLATION_EDITION, Stanza},
  ingest, report, seed,
};
use nta_adapters::{PlaintextConfig, PoemConfig, SegmentMode, count_repeated_words};
use nta_core::{report::InflectionQuery, repo::Repository};
use nta_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_POEM: &str = "data/Hávamál1.json";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "nta", version, about = "Norse text analytics over a property graph")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "nta.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Apply index definitions to the graph store.
  ApplySchema {
    /// Schema file; the built-in definitions when omitted.
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,
  },

  /// Ingest a verse/strophe/line poem JSON file.
  IngestJson {
    #[arg(long, value_name = "FILE", default_value = DEFAULT_POEM)]
    input:        PathBuf,
    #[arg(long)]
    work_id:      Option<String>,
    #[arg(long)]
    edition_id:   Option<String>,
    #[arg(long)]
    source_label: Option<String>,
  },

  /// Ingest a UTF-8 plain-text file.
  IngestPlaintext {
    #[arg(long, value_name = "FILE")]
    path:           PathBuf,
    #[arg(long)]
    work_id:        String,
    #[arg(long)]
    edition_id:     String,
    #[arg(long)]
    source_label:   String,
    /// Language or stage code, e.g. `on`, `nn`, `nb`.
    #[arg(long)]
    language_stage: String,
    #[arg(long)]
    date_start:     Option<i32>,
    #[arg(long)]
    date_end:       Option<i32>,
    /// `line` or `paragraph`.
    #[arg(long, default_value = "line")]
    segment:        SegmentMode,
  },

  /// Seed the Norway lemma-history example.
  SeedNorway,

  /// Write a manual translation alignment for the first Hávamál stanza.
  AlignDemo {
    #[arg(long, value_name = "FILE", default_value = DEFAULT_POEM)]
    input:                  PathBuf,
    #[arg(long, default_value = DEFAULT_SOURCE_EDITION)]
    source_edition_id:      String,
    #[arg(long, default_value = DEFAULT_TRANSLATION_EDITION)]
    translation_edition_id: String,
  },

  /// Report inflection observations for a lemma.
  ReportInflections {
    #[arg(long)]
    lemma_id:    String,
    /// Inclusive lower bound year.
    #[arg(long)]
    from_year:   Option<i32>,
    /// Inclusive upper bound year.
    #[arg(long)]
    to_year:     Option<i32>,
    /// Case-insensitive substring of the edition's source label.
    #[arg(long)]
    source_like: Option<String>,
    /// Max rows per section.
    #[arg(long, default_value_t = 20)]
    limit:       u32,
  },

  /// Report words repeated within one edition.
  ReportRepeated {
    #[arg(long)]
    edition_id: String,
    #[arg(long, default_value_t = 2)]
    min_count:  u64,
  },

  /// Count repeated words in a poem JSON file without touching the store.
  CountWords {
    #[arg(long, value_name = "FILE", default_value = DEFAULT_POEM)]
    input: PathBuf,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if let Command::CountWords { input } = &cli.command {
    return count_words(input);
  }

  let settings = Settings::load(&cli.config)?;
  let connection = settings.graph.connection()?;
  let store = SqliteStore::connect(&connection)
    .await
    .with_context(|| format!("failed to open graph store at {}", connection.uri))?;

  let outcome = run(cli.command, &store, &settings).await;
  let closed = store.close().await;
  outcome?;
  closed.context("failed to close graph store")?;
  Ok(())
}

async fn run(command: Command, store: &SqliteStore, settings: &Settings) -> anyhow::Result<()> {
  let mut repo = Repository::new(store);
  if let Some(deadline) = settings.graph.deadline() {
    repo = repo.with_deadline(deadline);
  }

  match command {
    Command::ApplySchema { schema } => {
      let definition = match &schema {
        Some(path) => std::fs::read_to_string(path)
          .with_context(|| format!("failed to read schema {}", path.display()))?,
        None => DEFAULT_SCHEMA.to_owned(),
      };
      let applied = repo.apply_schema(&definition).await?;
      println!("Schema applied: {applied} statements.");
    }

    Command::IngestJson { input, work_id, edition_id, source_label } => {
      let mut config = PoemConfig::default();
      if let Some(work_id) = work_id {
        config.work_id = work_id;
      }
      if let Some(edition_id) = edition_id {
        config.edition_id = edition_id;
      }
      if let Some(source_label) = source_label {
        config.source_label = source_label;
      }
      let stats = ingest::ingest_poem(&repo, &input, config).await?;
      println!("Ingested segments={} tokens={}", stats.segments, stats.tokens);
    }

    Command::IngestPlaintext {
      path,
      work_id,
      edition_id,
      source_label,
      language_stage,
      date_start,
      date_end,
      segment,
    } => {
      let config = PlaintextConfig {
        work_id,
        edition_id,
        source_label,
        language_stage,
        date_start,
        date_end,
        mode: segment,
      };
      let stats = ingest::ingest_plaintext(&repo, &path, config).await?;
      println!("Ingested segments={} tokens={}", stats.segments, stats.tokens);
    }

    Command::SeedNorway => {
      seed::seed_norway(&repo).await?;
      println!("Seeded Norway example graph data.");
    }

    Command::AlignDemo { input, source_edition_id, translation_edition_id } => {
      let stanza = Stanza::first_of(&input);
      let aligned =
        align::align_demo(&repo, &stanza, &source_edition_id, &translation_edition_id)
          .await?;
      println!(
        "Created alignment demo: edition {translation_edition_id} translates \
         {source_edition_id}; aligned_segments={aligned}"
      );
    }

    Command::ReportInflections { lemma_id, from_year, to_year, source_like, limit } => {
      let query = InflectionQuery {
        lemma_id,
        from_year,
        to_year,
        source_like,
        limit,
      };
      print!("{}", report::inflection_report(store, &query).await?);
    }

    Command::ReportRepeated { edition_id, min_count } => {
      print!("{}", report::repeated_report(store, &edition_id, min_count).await?);
    }

    Command::CountWords { input } => count_words(&input)?,
  }

  Ok(())
}

fn count_words(input: &Path) -> anyhow::Result<()> {
  let counts = count_repeated_words(input)
    .with_context(|| format!("failed to count words in {}", input.display()))?;
  for (word, count) in counts {
    println!("{word}: {count}");
  }
  Ok(())
}
