//! Deterministic identifier derivation.
//!
//! Every identifier is a pure function of its semantic inputs after key
//! normalization (NFKC, trim, lowercase, whitespace collapse). Digests are
//! SHA-256 over the TAB-joined normalized parts, rendered as lowercase hex and
//! prefixed with the entity kind. Nothing here reads the clock or any
//! randomness.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

static NON_SLUG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern compiles"));

static NON_REF: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_-]+").expect("ref pattern compiles"));

// ─── Key normalization ───────────────────────────────────────────────────────

/// Canonical form of a key part: NFKC, trimmed, lowercased, with internal
/// whitespace runs collapsed to a single space.
pub fn normalize_key(value: &str) -> String {
  let composed: String = value.nfkc().collect();
  let lowered = composed.trim().to_lowercase();
  WHITESPACE_RUN.replace_all(&lowered, " ").into_owned()
}

fn digest(parts: &[&str]) -> String {
  let joined = parts
    .iter()
    .map(|part| normalize_key(part))
    .collect::<Vec<_>>()
    .join("\t");
  hex::encode(Sha256::digest(joined.as_bytes()))
}

// ─── Entity identifiers ──────────────────────────────────────────────────────

/// Slug of the normalized title; `"work"` when nothing alphanumeric remains.
pub fn work_id(title_or_slug: &str) -> String {
  let normalized = normalize_key(title_or_slug);
  let slug = NON_SLUG.replace_all(&normalized, "-");
  let slug = slug.trim_matches('-');
  if slug.is_empty() {
    "work".to_owned()
  } else {
    slug.to_owned()
  }
}

pub fn witness_id(siglum: &str) -> String {
  format!("witness:{}", digest(&[siglum]))
}

pub fn edition_id(work: &str, source: &str, version: &str) -> String {
  format!("edition:{}", digest(&[work, source, version]))
}

/// Fallback segment identifier: `<edition>:segment:<ordinal>`.
pub fn segment_id(edition: &str, ordinal: u32) -> String {
  format!("{edition}:segment:{ordinal}")
}

/// Fallback token identifier: `<segment>:token:<position>`.
pub fn token_id(segment: &str, position: u32) -> String {
  format!("{segment}:token:{position}")
}

pub fn form_id(language: &str, orthography: &str) -> String {
  format!(
    "form:{}:{}",
    normalize_key(language),
    digest(&[language, orthography])
  )
}

pub fn lemma_id(language: &str, headword: &str) -> String {
  format!(
    "lemma:{}:{}",
    normalize_key(language),
    digest(&[language, headword])
  )
}

pub fn sense_id(lemma: &str, sense_key: &str) -> String {
  format!("sense:{}", digest(&[lemma, sense_key]))
}

/// `features` is the canonical feature string from [`feature_key`].
pub fn morph_analysis_id(target_id: &str, analyzer: &str, features: &str) -> String {
  format!("morph:{}", digest(&[target_id, analyzer, features]))
}

pub fn etymon_id(language: &str, form: &str, period: &str) -> String {
  format!("etymon:{}", digest(&[language, form, period]))
}

pub fn cognate_set_id(label: &str) -> String {
  format!("cset:{}", digest(&[label]))
}

pub fn source_id(citekey: &str) -> String {
  format!("source:{}", digest(&[citekey]))
}

pub fn claim_id(
  claim_type: &str,
  asserts_target_id: &str,
  statement: &str,
  source_id: &str,
) -> String {
  format!(
    "claim:{}",
    digest(&[claim_type, asserts_target_id, statement, source_id])
  )
}

/// `<name>:<version>`, e.g. `placeholder:0.1`.
pub fn analyzer_id(name: &str, version: &str) -> String {
  format!("{}:{}", normalize_key(name), normalize_key(version))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Order-independent `key=value;…` rendering of a feature set.
pub fn feature_key<K, V>(features: &[(K, V)]) -> String
where
  K: AsRef<str>,
  V: AsRef<str>,
{
  let mut pairs: Vec<String> = features
    .iter()
    .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
    .collect();
  pairs.sort();
  pairs.join(";")
}

/// Reduce a free-form reference label (`"I."`, `"12 b"`) to a fragment that
/// is safe inside a colon-separated identifier.
pub fn safe_ref_part(value: &str) -> String {
  let trimmed = value.trim();
  let trimmed = if trimmed.is_empty() { "x" } else { trimmed };
  let underscored = WHITESPACE_RUN.replace_all(trimmed, "_");
  let cleaned = NON_REF.replace_all(&underscored, "").to_lowercase();
  if cleaned.is_empty() { "x".to_owned() } else { cleaned }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn work_id_is_case_and_whitespace_insensitive() {
    let a = work_id("  My Work  ");
    let b = work_id("my work");
    assert_eq!(a, b);
    assert_eq!(a, "my-work");
  }

  #[test]
  fn work_id_falls_back_when_slug_is_empty() {
    assert_eq!(work_id("   "), "work");
    assert_eq!(work_id("!!!"), "work");
  }

  #[test]
  fn edition_id_is_deterministic_for_normalized_input() {
    let a = edition_id(" Havamal ", " Gudni  Jonsson ", " V1 ");
    let b = edition_id("havamal", "gudni jonsson", "v1");
    assert_eq!(a, b);
    assert!(a.starts_with("edition:"));
  }

  #[test]
  fn nfkc_variants_share_an_identifier() {
    // U+FB01 LATIN SMALL LIGATURE FI decomposes to "fi" under NFKC.
    assert_eq!(source_id("\u{FB01}nnur"), source_id("finnur"));
  }

  #[test]
  fn form_and_lemma_ids_carry_prefix_and_language() {
    let form = form_id("Old Norse", "Nóregr");
    let lemma = lemma_id("Old Norse", "Nóregr");
    assert!(form.starts_with("form:old norse:"));
    assert!(lemma.starts_with("lemma:old norse:"));
    assert_ne!(form_id("non", "Nóregr"), form_id("nn", "Nóregr"));
  }

  #[test]
  fn claim_id_is_deterministic_and_changes_with_statement() {
    let a = claim_id("ETYMOLOGY", "lemma:1", "same statement", "source:1");
    let b = claim_id("etymology", " lemma:1 ", " same  statement ", " source:1 ");
    let c = claim_id("etymology", "lemma:1", "different statement", "source:1");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.starts_with("claim:"));
  }

  #[test]
  fn statement_a_and_b_differ() {
    assert_ne!(
      claim_id("etymology", "lemma:1", "statement A", "source:1"),
      claim_id("etymology", "lemma:1", "statement B", "source:1"),
    );
  }

  #[test]
  fn morph_analysis_id_normalizes_analyzer_name() {
    let a = morph_analysis_id("seg1:token:0", " Placeholder ", "");
    let b = morph_analysis_id("seg1:token:0", "placeholder", "");
    assert_eq!(a, b);
    assert!(a.starts_with("morph:"));
  }

  #[test]
  fn empty_inputs_are_deterministic() {
    assert_eq!(source_id(""), source_id(""));
    assert_eq!(cognate_set_id(""), cognate_set_id("  "));
  }

  #[test]
  fn fallback_ids_compose() {
    let seg = segment_id("E", 3);
    assert_eq!(seg, "E:segment:3");
    assert_eq!(token_id(&seg, 0), "E:segment:3:token:0");
  }

  #[test]
  fn feature_key_ignores_order() {
    let a = feature_key(&[("case", "nom"), ("number", "sg")]);
    let b = feature_key(&[("number", "sg"), ("case", "nom")]);
    assert_eq!(a, b);
    assert_eq!(a, "case=nom;number=sg");
  }

  #[test]
  fn safe_ref_part_slugs_labels() {
    assert_eq!(safe_ref_part("I."), "i");
    assert_eq!(safe_ref_part(" 12 b "), "12_b");
    assert_eq!(safe_ref_part("   "), "x");
    assert_eq!(safe_ref_part("…"), "x");
  }

  #[test]
  fn analyzer_id_joins_name_and_version() {
    assert_eq!(analyzer_id("Placeholder", "0.1"), "placeholder:0.1");
  }
}
