//! SQL schema for the SQLite graph store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per node. node_key is the canonical (key-sorted) JSON of the
-- identity properties; props holds every property, identity included.
CREATE TABLE IF NOT EXISTS nodes (
    label     TEXT NOT NULL,
    node_key  TEXT NOT NULL,
    props     TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (label, node_key)
);

-- At most one edge of a given type between two nodes.
CREATE TABLE IF NOT EXISTS edges (
    rel_type   TEXT NOT NULL,
    src_label  TEXT NOT NULL,
    src_key    TEXT NOT NULL,
    dst_label  TEXT NOT NULL,
    dst_key    TEXT NOT NULL,
    props      TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (rel_type, src_label, src_key, dst_label, dst_key)
);

CREATE INDEX IF NOT EXISTS edges_dst_idx ON edges(rel_type, dst_label, dst_key);

CREATE TABLE IF NOT EXISTS principals (
    principal          TEXT PRIMARY KEY,
    credential_sha256  TEXT NOT NULL
);

-- Every token with its segment and edition.
CREATE VIEW IF NOT EXISTS token_context AS
SELECT
    t.node_key                              AS token_key,
    json_extract(t.props, '$.surface')      AS surface,
    json_extract(t.props, '$.normalized')   AS normalized,
    json_extract(t.props, '$.position')     AS token_position,
    json_extract(s.props, '$.ref')          AS segment_ref,
    json_extract(s.props, '$.text')         AS segment_text,
    json_extract(e.props, '$.edition_id')   AS edition_id,
    json_extract(e.props, '$.source_label') AS source_label,
    json_extract(e.props, '$.date_start')   AS date_start,
    json_extract(e.props, '$.date_end')     AS date_end
FROM edges hs
JOIN nodes e  ON e.label = 'Edition' AND e.node_key = hs.src_key
JOIN nodes s  ON s.label = 'Segment' AND s.node_key = hs.dst_key
JOIN edges ht ON ht.rel_type = 'HAS_TOKEN'
             AND ht.src_label = 'Segment' AND ht.src_key = hs.dst_key
             AND ht.dst_label = 'Token'
JOIN nodes t  ON t.label = 'Token' AND t.node_key = ht.dst_key
WHERE hs.rel_type = 'HAS_SEGMENT'
  AND hs.src_label = 'Edition'
  AND hs.dst_label = 'Segment';

-- Features attached to each analysis.
CREATE VIEW IF NOT EXISTS analysis_features AS
SELECT
    hf.src_key                        AS analysis_key,
    json_extract(f.props, '$.key')    AS feature_key,
    json_extract(f.props, '$.value')  AS feature_value
FROM edges hf
JOIN nodes f ON f.label = 'Feature' AND f.node_key = hf.dst_key
WHERE hf.rel_type = 'HAS_FEATURE'
  AND hf.src_label = 'MorphAnalysis';

PRAGMA user_version = 1;
";
