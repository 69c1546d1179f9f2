//! One module per group of subcommands. Each takes an open repository or
//! store; the binary owns connection setup and teardown.

pub mod align;
pub mod ingest;
pub mod report;
pub mod seed;

/// Index definitions applied by `apply-schema` when no file is given.
pub const DEFAULT_SCHEMA: &str = include_str!("../../schema/default.sql");
