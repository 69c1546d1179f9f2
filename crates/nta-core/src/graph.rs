//! The graph write algebra.
//!
//! A [`Statement`] is an ordered list of MERGE / SET clauses. Node labels and
//! relationship types come from closed enums ([`NodeKind`], [`RelType`]); the
//! single open path, [`Label::Dynamic`], can only be built from an [`Ident`]
//! that passed [`is_safe_identifier`]. Property names are either compile-time
//! constants or validated idents, so nothing caller-controlled is ever spliced
//! into query text; values always travel as parameters.
//!
//! Backends may interpret the clauses directly (`nta-store-sqlite` does) or
//! send the text from [`Statement::to_cypher`] to a Cypher endpoint.

use std::{borrow::Cow, collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;
use serde_json::{Map, Value};

use crate::{Error, Result};

static SAFE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("identifier pattern compiles")
});

/// `^[A-Za-z][A-Za-z0-9_]*$`
pub fn is_safe_identifier(value: &str) -> bool {
  SAFE_IDENTIFIER.is_match(value)
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// A label, relationship or property name that is safe to place in query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(Cow<'static, str>);

impl Ident {
  /// Validate a runtime-supplied name.
  pub fn parse(value: &str) -> Result<Self> {
    if is_safe_identifier(value) {
      Ok(Self(Cow::Owned(value.to_owned())))
    } else {
      Err(Error::UnsafeIdentifier(value.to_owned()))
    }
  }

  fn constant(value: &'static str) -> Self {
    debug_assert!(
      is_safe_identifier(value),
      "constant identifier {value:?} is not safe"
    );
    Self(Cow::Borrowed(value))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Ident {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Labels and relationship types ───────────────────────────────────────────

/// Every node label the repository writes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::IntoStaticStr,
  strum::EnumString,
  strum::EnumIter,
)]
pub enum NodeKind {
  Work,
  Edition,
  Segment,
  Token,
  Form,
  Lemma,
  MorphAnalysis,
  Feature,
  Claim,
  Source,
  Analyzer,
  Etymon,
}

impl NodeKind {
  pub fn as_str(self) -> &'static str { self.into() }

  /// The identity property. [`NodeKind::Feature`] is keyed by `(key, value)`;
  /// this returns its first half.
  pub fn key_field(self) -> &'static str {
    match self {
      Self::Work => "work_id",
      Self::Edition => "edition_id",
      Self::Segment => "segment_id",
      Self::Token => "token_id",
      Self::Form => "form_id",
      Self::Lemma => "lemma_id",
      Self::MorphAnalysis => "analysis_id",
      Self::Feature => "key",
      Self::Claim => "claim_id",
      Self::Source => "source_id",
      Self::Analyzer => "analyzer_id",
      Self::Etymon => "etymon_id",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
  Kind(NodeKind),
  Dynamic(Ident),
}

impl Label {
  /// Resolve a runtime label name, preferring a known kind.
  pub fn parse(name: &str) -> Result<Self> {
    match name.parse::<NodeKind>() {
      Ok(kind) => Ok(Self::Kind(kind)),
      Err(_) => Ident::parse(name).map(Self::Dynamic),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Kind(kind) => kind.as_str(),
      Self::Dynamic(ident) => ident.as_str(),
    }
  }
}

impl From<NodeKind> for Label {
  fn from(kind: NodeKind) -> Self { Self::Kind(kind) }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::IntoStaticStr,
  strum::EnumString,
  strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RelType {
  HasEdition,
  Translates,
  HasSegment,
  HasToken,
  AlignedTo,
  InstanceOfForm,
  NormalizedTo,
  OrthographicVariantOf,
  Realizes,
  HasAnalysis,
  HasFeature,
  AnalyzesAs,
  ProducedBy,
  SupportedBy,
  Asserts,
  Contradicts,
  DerivesFrom,
  BorrowedFrom,
}

impl RelType {
  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Properties ──────────────────────────────────────────────────────────────

/// An ordered property map. Setting a property to `null` removes it, as in
/// Cypher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(Vec<(Ident, Value)>);

impl Props {
  pub fn new() -> Self { Self::default() }

  /// Add a property whose name is a compile-time constant.
  pub fn with(self, field: &'static str, value: impl Into<Value>) -> Self {
    self.with_ident(Ident::constant(field), value.into())
  }

  pub fn with_ident(mut self, field: Ident, value: Value) -> Self {
    match self.0.iter_mut().find(|(name, _)| *name == field) {
      Some(slot) => slot.1 = value,
      None => self.0.push((field, value)),
    }
    self
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self
      .0
      .iter()
      .find(|(name, _)| name.as_str() == field)
      .map(|(_, value)| value)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Ident, &Value)> {
    self.0.iter().map(|(name, value)| (name, value))
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn to_json(&self) -> Map<String, Value> {
    self
      .0
      .iter()
      .map(|(name, value)| (name.as_str().to_owned(), value.clone()))
      .collect()
  }

  /// Key-sorted compact JSON; two equal property sets always render the same
  /// string regardless of insertion order.
  pub fn canonical_json(&self) -> String {
    let sorted: BTreeMap<&str, &Value> = self
      .0
      .iter()
      .map(|(name, value)| (name.as_str(), value))
      .collect();
    serde_json::to_string(&sorted).unwrap_or_else(|_| "{}".to_owned())
  }
}

// ─── Node references ─────────────────────────────────────────────────────────

/// A node addressed by label and identity properties.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
  pub label: Label,
  pub key:   Props,
}

impl NodeRef {
  pub fn of(kind: NodeKind, id: impl Into<String>) -> Self {
    Self {
      label: kind.into(),
      key:   Props::new().with(kind.key_field(), id.into()),
    }
  }

  pub fn feature(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      label: NodeKind::Feature.into(),
      key:   Props::new().with("key", key.into()).with("value", value.into()),
    }
  }

  /// A node whose label and identity field are supplied at runtime. Both are
  /// validated before anything is built. A known kind must be addressed by
  /// its own key field, otherwise the merge would miss the stored node and
  /// create a second one.
  pub fn dynamic(
    label: &str,
    id_field: &str,
    id: impl Into<String>,
  ) -> Result<Self> {
    let label = Label::parse(label)?;
    let field = Ident::parse(id_field)?;
    if let Label::Kind(kind) = label {
      if kind == NodeKind::Feature || field.as_str() != kind.key_field() {
        return Err(Error::InvalidConfig(format!(
          "{} nodes cannot be matched by {:?}",
          kind.as_str(),
          field.as_str(),
        )));
      }
    }
    Ok(Self {
      label,
      key: Props::new().with_ident(field, Value::String(id.into())),
    })
  }
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
  /// Match the node by its key or create it with only the key set.
  MergeNode { var: &'static str, node: NodeRef },
  /// Applies only when the preceding MERGE of `var` created the node.
  OnCreateSet { var: &'static str, props: Props },
  Set { var: &'static str, props: Props },
  /// Match or create a single `from -[rel]-> to` edge.
  MergeEdge {
    var:  &'static str,
    from: &'static str,
    rel:  RelType,
    to:   &'static str,
  },
}

/// One graph write, executed by the store as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
  clauses: Vec<Clause>,
}

impl Statement {
  pub fn new() -> Self { Self::default() }

  pub fn merge(mut self, var: &'static str, node: NodeRef) -> Self {
    self.clauses.push(Clause::MergeNode { var, node });
    self
  }

  pub fn on_create(mut self, var: &'static str, props: Props) -> Self {
    if !props.is_empty() {
      self.clauses.push(Clause::OnCreateSet { var, props });
    }
    self
  }

  pub fn set(mut self, var: &'static str, props: Props) -> Self {
    if !props.is_empty() {
      self.clauses.push(Clause::Set { var, props });
    }
    self
  }

  pub fn relate(
    mut self,
    var: &'static str,
    from: &'static str,
    rel: RelType,
    to: &'static str,
  ) -> Self {
    self.clauses.push(Clause::MergeEdge { var, from, rel, to });
    self
  }

  pub fn clauses(&self) -> &[Clause] { &self.clauses }

  /// Every node merged by this statement, in order.
  pub fn nodes(&self) -> impl Iterator<Item = &NodeRef> {
    self.clauses.iter().filter_map(|clause| match clause {
      Clause::MergeNode { node, .. } => Some(node),
      _ => None,
    })
  }

  /// Every relationship type merged by this statement, in order.
  pub fn relationships(&self) -> impl Iterator<Item = RelType> + '_ {
    self.clauses.iter().filter_map(|clause| match clause {
      Clause::MergeEdge { rel, .. } => Some(*rel),
      _ => None,
    })
  }

  /// Render as parameterized Cypher. Parameters are named `p0`, `p1`, … in
  /// order of appearance.
  pub fn to_cypher(&self) -> (String, Map<String, Value>) {
    let mut params = Map::new();
    let mut lines = Vec::with_capacity(self.clauses.len());

    let mut bind = |value: &Value| {
      let name = format!("p{}", params.len());
      params.insert(name.clone(), value.clone());
      format!("${name}")
    };

    for clause in &self.clauses {
      let line = match clause {
        Clause::MergeNode { var, node } => {
          let key = node
            .key
            .iter()
            .map(|(field, value)| format!("{field}: {}", bind(value)))
            .collect::<Vec<_>>()
            .join(", ");
          format!("MERGE ({var}:{} {{{key}}})", node.label.as_str())
        }
        Clause::OnCreateSet { var, props } => {
          format!("ON CREATE SET {}", render_assignments(var, props, &mut bind))
        }
        Clause::Set { var, props } => {
          format!("SET {}", render_assignments(var, props, &mut bind))
        }
        Clause::MergeEdge { var, from, rel, to } => {
          format!("MERGE ({from})-[{var}:{}]->({to})", rel.as_str())
        }
      };
      lines.push(line);
    }

    (lines.join("\n"), params)
  }
}

fn render_assignments(
  var: &str,
  props: &Props,
  bind: &mut impl FnMut(&Value) -> String,
) -> String {
  props
    .iter()
    .map(|(field, value)| format!("{var}.{field} = {}", bind(value)))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Schema definitions ──────────────────────────────────────────────────────

/// Split a schema definition on `;`, dropping entries that are blank or
/// consist only of `--` / `//` line comments.
pub fn schema_statements(definition: &str) -> Vec<String> {
  definition
    .split(';')
    .map(|chunk| {
      chunk
        .lines()
        .filter(|line| {
          let line = line.trim_start();
          !(line.starts_with("--") || line.starts_with("//"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
    })
    .filter(|statement| !statement.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn safe_identifier_pattern() {
    assert!(is_safe_identifier("Lemma"));
    assert!(is_safe_identifier("lemma_id"));
    assert!(is_safe_identifier("X9"));
    assert!(!is_safe_identifier(""));
    assert!(!is_safe_identifier("9Lemma"));
    assert!(!is_safe_identifier("_lemma"));
    assert!(!is_safe_identifier("Lemma Node"));
    assert!(!is_safe_identifier("Lemma;"));
    assert!(!is_safe_identifier("Lemma}) DETACH DELETE (n"));
    assert!(!is_safe_identifier("Lémma"));
  }

  #[test]
  fn every_builtin_name_is_safe() {
    for kind in NodeKind::iter() {
      assert!(is_safe_identifier(kind.as_str()));
      assert!(is_safe_identifier(kind.key_field()));
    }
    for rel in RelType::iter() {
      assert!(is_safe_identifier(rel.as_str()));
    }
  }

  #[test]
  fn rel_types_render_screaming_snake_case() {
    assert_eq!(RelType::InstanceOfForm.as_str(), "INSTANCE_OF_FORM");
    assert_eq!(
      RelType::OrthographicVariantOf.as_str(),
      "ORTHOGRAPHIC_VARIANT_OF"
    );
    assert_eq!("HAS_TOKEN".parse::<RelType>().ok(), Some(RelType::HasToken));
  }

  #[test]
  fn label_parse_prefers_known_kinds() {
    assert_eq!(Label::parse("Lemma").ok(), Some(Label::Kind(NodeKind::Lemma)));
    assert!(matches!(Label::parse("Witness"), Ok(Label::Dynamic(_))));
    assert!(matches!(
      Label::parse("Bad Label"),
      Err(Error::UnsafeIdentifier(_))
    ));
  }

  #[test]
  fn dynamic_node_ref_rejects_unsafe_field() {
    let err = NodeRef::dynamic("Lemma", "lemma_id}) MATCH (x", "lemma:1");
    assert!(matches!(err, Err(Error::UnsafeIdentifier(_))));
  }

  #[test]
  fn dynamic_node_ref_requires_known_kind_key() {
    assert!(matches!(
      NodeRef::dynamic("Lemma", "headword", "Nóregr"),
      Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
      NodeRef::dynamic("Feature", "key", "case"),
      Err(Error::InvalidConfig(_))
    ));
    let lemma = NodeRef::dynamic("Lemma", "lemma_id", "lemma:x").unwrap();
    assert_eq!(lemma, NodeRef::of(NodeKind::Lemma, "lemma:x"));
  }

  #[test]
  fn props_overwrite_in_place() {
    let props = Props::new().with("a", 1).with("b", 2).with("a", 3);
    assert_eq!(props.get("a"), Some(&Value::from(3)));
    assert_eq!(props.iter().count(), 2);
  }

  #[test]
  fn canonical_json_is_order_independent() {
    let a = Props::new().with("key", "case").with("value", "nom");
    let b = Props::new().with("value", "nom").with("key", "case");
    assert_eq!(a.canonical_json(), b.canonical_json());
    assert_eq!(a.canonical_json(), r#"{"key":"case","value":"nom"}"#);
  }

  #[test]
  fn renders_parameterized_cypher() {
    let statement = Statement::new()
      .merge("w", NodeRef::of(NodeKind::Work, "havamal"))
      .merge("e", NodeRef::of(NodeKind::Edition, "ed1"))
      .relate("r", "w", RelType::HasEdition, "e")
      .set("r", Props::new().with("since", 1));

    let (text, params) = statement.to_cypher();
    assert_eq!(
      text,
      "MERGE (w:Work {work_id: $p0})\n\
       MERGE (e:Edition {edition_id: $p1})\n\
       MERGE (w)-[r:HAS_EDITION]->(e)\n\
       SET r.since = $p2"
    );
    assert_eq!(params.get("p0"), Some(&Value::from("havamal")));
    assert_eq!(params.len(), 3);
  }

  #[test]
  fn empty_set_clauses_are_skipped() {
    let statement = Statement::new()
      .merge("n", NodeRef::of(NodeKind::Form, "f"))
      .set("n", Props::new())
      .on_create("n", Props::new());
    assert_eq!(statement.clauses().len(), 1);
  }

  #[test]
  fn schema_statements_drop_blank_and_comment_entries() {
    let definition = "
      -- indexes
      CREATE INDEX a ON nodes(label);

      ;
      // only a comment
      ;
      CREATE INDEX b ON edges(rel_type)
    ";
    let statements = schema_statements(definition);
    assert_eq!(
      statements,
      vec!["CREATE INDEX a ON nodes(label)", "CREATE INDEX b ON edges(rel_type)"]
    );
  }
}
