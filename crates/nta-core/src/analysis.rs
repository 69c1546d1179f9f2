//! Morphological analyzer seam.
//!
//! No real analysis is implemented; [`PlaceholderAnalyzer`] records an
//! `UNKNOWN` reading per token so the analysis sub-graph has its final shape
//! before a real analyzer is plugged in.

use crate::{
  ids,
  model::{Analyzer, Token, UNKNOWN_POS},
};

/// What an analyzer says about one token.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
  pub pos:          String,
  pub confidence:   f64,
  pub is_ambiguous: bool,
  /// `(key, value)` pairs, e.g. `("case", "nom")`.
  pub features:     Vec<(String, String)>,
  pub lemma_id:     Option<String>,
}

pub trait MorphAnalyzer: Send + Sync {
  /// Short name recorded on each analysis, e.g. `"placeholder"`.
  fn name(&self) -> &str;

  fn version(&self) -> &str;

  /// The `Analyzer` node this analyzer is recorded as.
  fn descriptor(&self) -> Analyzer;

  fn analyze(&self, token: &Token) -> AnalysisOutput;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAnalyzer;

impl PlaceholderAnalyzer {
  pub const NAME: &'static str = "placeholder";
  pub const VERSION: &'static str = "0.1";
}

impl MorphAnalyzer for PlaceholderAnalyzer {
  fn name(&self) -> &str { Self::NAME }

  fn version(&self) -> &str { Self::VERSION }

  fn descriptor(&self) -> Analyzer {
    Analyzer {
      analyzer_id: ids::analyzer_id(Self::NAME, Self::VERSION),
      name:        "Placeholder Analyzer".into(),
      version:     Self::VERSION.into(),
      description: Some("Bootstrap analyzer for morphology scaffolding.".into()),
      author:      Some("norse_text_analytics".into()),
    }
  }

  fn analyze(&self, _token: &Token) -> AnalysisOutput {
    AnalysisOutput {
      pos:          UNKNOWN_POS.into(),
      confidence:   0.0,
      is_ambiguous: false,
      features:     Vec::new(),
      lemma_id:     None,
    }
  }
}
