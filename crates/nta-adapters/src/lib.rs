//! Source adapters for the Norse text graph.
//!
//! Each adapter reads one raw source and produces a deterministic
//! [`AdapterOutput`](nta_core::adapter::AdapterOutput). Pure synchronous; no
//! database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use nta_adapters::PoemJsonAdapter;
//! use nta_core::adapter::{RawSource, SourceAdapter};
//!
//! let raw = RawSource {
//!   source_id:    "havamal-json".into(),
//!   kind:         "poem_json".into(),
//!   origin:       "data/Hávamál1.json".into(),
//!   retrieved_at: None,
//!   notes:        None,
//! };
//! let output = PoemJsonAdapter::default().adapt(&raw).unwrap();
//! println!("{} segments, {} tokens", output.segments.len(), output.token_count());
//! ```

pub mod error;
mod plaintext;
mod poem;
mod wordcount;

use std::path::Path;

pub use error::{Error, Result};
pub use plaintext::{PlaintextAdapter, PlaintextConfig, SegmentMode, UnknownSegmentMode};
pub use poem::{PoemConfig, PoemDocument, PoemJsonAdapter};
pub use wordcount::{count_repeated_words, strip_line};

pub(crate) fn read_source(path: &Path) -> Result<String> {
  std::fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_owned(),
    source,
  })
}
