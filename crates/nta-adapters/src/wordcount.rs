//! Local word frequency over a poem JSON file, without touching the graph.
//!
//! Kept for quick inspection of a source; the graph-backed repeated-words
//! report is the authoritative count and the two are not guaranteed to agree.

use std::{collections::BTreeMap, path::Path};

use crate::{PoemDocument, Result, read_source};

const STRIPPED: &[char] = &['.', ',', ';', ':', '!', '?', '"'];

/// Split on single spaces, drop [`STRIPPED`] characters anywhere in a word
/// and lowercase.
pub fn strip_line(line: &str) -> Vec<String> {
  line
    .split(' ')
    .map(|word| word.replace(STRIPPED, "").to_lowercase())
    .collect()
}

/// Words occurring more than once across every line of the poem, in
/// alphabetical order.
pub fn count_repeated_words(path: &Path) -> Result<Vec<(String, u64)>> {
  let document = PoemDocument::from_json(&read_source(path)?)?;
  Ok(repeated_words(&document))
}

pub(crate) fn repeated_words(document: &PoemDocument) -> Vec<(String, u64)> {
  let mut counts: BTreeMap<String, u64> = BTreeMap::new();
  let lines = document
    .poem
    .verses
    .iter()
    .flat_map(|verse| &verse.strophes)
    .flat_map(|strophe| &strophe.lines);

  for line in lines {
    for word in strip_line(line) {
      if !word.is_empty() {
        *counts.entry(word).or_default() += 1;
      }
    }
  }

  counts.into_iter().filter(|(_, count)| *count > 1).collect()
}
