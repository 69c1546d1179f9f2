//! Tokenization and surface normalization (policy v0).
//!
//! Both functions are pure and locale-independent: the only knowledge they
//! carry is the fixed [`SURROUNDING_PUNCT`] set.

use std::sync::LazyLock;

use regex::Regex;

/// Stored on editions and `NORMALIZED_TO` edges so later policies can be told
/// apart from data normalized under this one.
pub const NORMALIZATION_POLICY_V0: &str = "punct_strip_whitespace_collapse_v0";

/// Characters stripped from both ends of a token.
pub const SURROUNDING_PUNCT: &[char] = &[
  ' ', '\t', '\n', '\r', '.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[',
  ']', '{', '}', '<', '>', '«', '»', '„', '“', '”', '‘', '’', '`', '´', '…',
  '—', '-',
];

static WHITESPACE_RUN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Strip surrounding punctuation, collapse internal whitespace, trim.
pub fn normalize(surface: &str) -> String {
  let stripped = surface.trim_matches(SURROUNDING_PUNCT);
  WHITESPACE_RUN.replace_all(stripped, " ").trim().to_owned()
}

/// Split on whitespace and strip surrounding punctuation from each piece.
/// Pieces that are pure punctuation are dropped; internal punctuation such as
/// the hyphen in a compound survives.
pub fn tokenize(line: &str) -> Vec<String> {
  tokenize_spans(line).into_iter().map(|span| span.text).collect()
}

/// A token together with its position in the source line, counted in chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
  pub text:       String,
  pub char_start: u32,
  /// Exclusive.
  pub char_end:   u32,
}

/// [`tokenize`], keeping character offsets.
pub fn tokenize_spans(line: &str) -> Vec<Span> {
  let mut spans = Vec::new();
  let mut piece_start: Option<(usize, u32)> = None;
  let mut char_pos: u32 = 0;

  for (byte_pos, ch) in line.char_indices() {
    if ch.is_whitespace() {
      if let Some((start_byte, start_char)) = piece_start.take() {
        push_span(&mut spans, &line[start_byte..byte_pos], start_char);
      }
    } else if piece_start.is_none() {
      piece_start = Some((byte_pos, char_pos));
    }
    char_pos += 1;
  }
  if let Some((start_byte, start_char)) = piece_start {
    push_span(&mut spans, &line[start_byte..], start_char);
  }

  spans
}

fn push_span(spans: &mut Vec<Span>, piece: &str, piece_char_start: u32) {
  let cleaned = piece.trim_matches(SURROUNDING_PUNCT);
  if cleaned.is_empty() {
    return;
  }
  let leading = piece.trim_start_matches(SURROUNDING_PUNCT);
  let skipped = piece.len() - leading.len();
  let char_start = piece_char_start + piece[..skipped].chars().count() as u32;
  let char_end = char_start + cleaned.chars().count() as u32;
  spans.push(Span { text: cleaned.to_owned(), char_start, char_end });
}
