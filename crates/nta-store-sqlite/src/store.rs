//! [`SqliteStore`], the SQLite implementation of [`GraphStore`].

use std::path::{Path, PathBuf};

use nta_core::{
  config::GraphConfig,
  graph::{NodeRef, RelType, Statement},
  store::GraphStore,
};
use rusqlite::OptionalExtension as _;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{
  encode::{self, NodeId},
  schema::SCHEMA,
  Error, Result,
};

const MEMORY_URI: &str = "sqlite::memory:";
const FILE_SCHEME: &str = "sqlite://";

enum Location {
  Memory,
  File(PathBuf),
}

fn parse_uri(uri: &str) -> Result<Location> {
  if uri == MEMORY_URI {
    return Ok(Location::Memory);
  }
  match uri.strip_prefix(FILE_SCHEME) {
    Some(path) if !path.is_empty() => Ok(Location::File(PathBuf::from(path))),
    _ => Err(Error::UnsupportedUri(uri.to_owned())),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A property graph backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the database named by `config.uri` and check the principal's
  /// credential. The first connection as a principal records its credential;
  /// later connections must present the same one.
  pub async fn connect(config: &GraphConfig) -> Result<Self> {
    let store = match parse_uri(&config.uri)? {
      Location::Memory => Self::open_in_memory().await?,
      Location::File(path) => Self::open(path).await?,
    };
    store.authenticate(&config.user, config.password()).await?;
    info!(uri = %config.uri, user = %config.user, "graph store connected");
    Ok(store)
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Release the connection, flushing any pending work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn authenticate(&self, principal: &str, credential: &str) -> Result<()> {
    let digest = hex::encode(Sha256::digest(credential.as_bytes()));
    let name = principal.to_owned();
    let presented = digest.clone();

    let stored: Option<String> = self
      .conn
      .call(move |conn| {
        let stored = conn
          .query_row(
            "SELECT credential_sha256 FROM principals WHERE principal = ?1",
            rusqlite::params![name],
            |row| row.get(0),
          )
          .optional()?;
        if stored.is_none() {
          conn.execute(
            "INSERT INTO principals (principal, credential_sha256) VALUES (?1, ?2)",
            rusqlite::params![name, presented],
          )?;
        }
        Ok(stored)
      })
      .await?;

    match stored {
      Some(stored) if stored != digest => Err(Error::AuthFailed(principal.to_owned())),
      Some(_) => Ok(()),
      None => {
        debug!(principal, "recorded credential for new principal");
        Ok(())
      }
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Number of nodes, optionally restricted to one label.
  pub async fn count_nodes(&self, label: Option<&str>) -> Result<u64> {
    let label = label.map(str::to_owned);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM nodes WHERE ?1 IS NULL OR label = ?1",
          rusqlite::params![label],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  /// Number of edges, optionally restricted to one relationship type.
  pub async fn count_edges(&self, rel: Option<RelType>) -> Result<u64> {
    let rel = rel.map(RelType::as_str);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM edges WHERE ?1 IS NULL OR rel_type = ?1",
          rusqlite::params![rel],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  /// All properties of `node`, identity included.
  pub async fn get_node(&self, node: &NodeRef) -> Result<Option<Map<String, Value>>> {
    let NodeId { label, key } = NodeId::of(node);
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT props FROM nodes WHERE label = ?1 AND node_key = ?2",
            rusqlite::params![label, key],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    raw.map(|props| decode_props(&props)).transpose()
  }

  /// Properties of the `from -[rel]-> to` edge, if it exists.
  pub async fn get_edge(
    &self,
    from: &NodeRef,
    rel: RelType,
    to: &NodeRef,
  ) -> Result<Option<Map<String, Value>>> {
    let src = NodeId::of(from);
    let dst = NodeId::of(to);
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT props FROM edges
             WHERE rel_type = ?1
               AND src_label = ?2 AND src_key = ?3
               AND dst_label = ?4 AND dst_key = ?5",
            rusqlite::params![rel.as_str(), src.label, src.key, dst.label, dst.key],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    raw.map(|props| decode_props(&props)).transpose()
  }
}

fn decode_props(raw: &str) -> Result<Map<String, Value>> {
  Ok(serde_json::from_str(raw)?)
}

// ─── GraphStore impl ─────────────────────────────────────────────────────────

impl GraphStore for SqliteStore {
  type Error = Error;

  async fn run(&self, statement: Statement) -> Result<()> {
    let plan = encode::plan(&statement)?;
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        encode::execute(&tx, &plan)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn execute_schema(&self, statement: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&statement)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
