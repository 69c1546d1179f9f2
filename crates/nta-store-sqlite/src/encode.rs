//! Lowering a [`Statement`] into SQL-ready steps.
//!
//! Variable references are resolved here, before the statement reaches the
//! database thread, so a malformed statement never opens a transaction.
//! Node identities become `(label, node_key)` pairs where `node_key` is the
//! canonical JSON of the identity properties; property updates become JSON
//! merge patches (a `null` value removes the property).

use nta_core::graph::{Clause, NodeRef, Props, RelType, Statement};
use rusqlite::Transaction;

use crate::{Error, Result};

// ─── Plan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeId {
  pub label: String,
  pub key:   String,
}

impl NodeId {
  pub fn of(node: &NodeRef) -> Self {
    Self {
      label: node.label.as_str().to_owned(),
      key:   node.key.canonical_json(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeId {
  pub rel: &'static str,
  pub src: NodeId,
  pub dst: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
  Node(usize),
  Edge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  MergeNode(usize),
  MergeEdge(usize),
  /// Patch applied only when `Target` was created by this statement.
  OnCreate(Target, String),
  Set(Target, String),
}

/// A statement with every variable resolved.
#[derive(Debug, Clone, Default)]
pub struct Plan {
  pub nodes: Vec<NodeId>,
  pub edges: Vec<EdgeId>,
  pub steps: Vec<Step>,
}

/// Resolve `statement` into a [`Plan`]. Rebinding a variable shadows the
/// earlier binding, as consecutive Cypher clauses would.
pub fn plan(statement: &Statement) -> Result<Plan> {
  let mut plan = Plan::default();
  let mut bound: Vec<(&'static str, Target)> = Vec::new();

  for clause in statement.clauses() {
    match clause {
      Clause::MergeNode { var, node } => {
        let index = plan.nodes.len();
        plan.nodes.push(NodeId::of(node));
        plan.steps.push(Step::MergeNode(index));
        bound.push((*var, Target::Node(index)));
      }
      Clause::MergeEdge { var, from, rel, to } => {
        let src = node_of(&plan, lookup(&bound, *from)?, *from)?;
        let dst = node_of(&plan, lookup(&bound, *to)?, *to)?;
        let index = plan.edges.len();
        plan.edges.push(edge(*rel, src, dst));
        plan.steps.push(Step::MergeEdge(index));
        bound.push((*var, Target::Edge(index)));
      }
      Clause::OnCreateSet { var, props } => {
        let target = lookup(&bound, *var)?;
        plan.steps.push(Step::OnCreate(target, patch(props)?));
      }
      Clause::Set { var, props } => {
        let target = lookup(&bound, *var)?;
        plan.steps.push(Step::Set(target, patch(props)?));
      }
    }
  }

  Ok(plan)
}

fn lookup(bound: &[(&'static str, Target)], var: &'static str) -> Result<Target> {
  bound
    .iter()
    .rev()
    .find(|(name, _)| *name == var)
    .map(|(_, target)| *target)
    .ok_or(Error::UnboundVariable(var))
}

fn node_of(plan: &Plan, target: Target, var: &'static str) -> Result<NodeId> {
  match target {
    Target::Node(index) => Ok(plan.nodes[index].clone()),
    Target::Edge(_) => Err(Error::UnboundVariable(var)),
  }
}

fn edge(rel: RelType, src: NodeId, dst: NodeId) -> EdgeId {
  EdgeId { rel: rel.as_str(), src, dst }
}

fn patch(props: &Props) -> Result<String> {
  Ok(serde_json::to_string(&props.to_json())?)
}

// ─── Execution ───────────────────────────────────────────────────────────────

/// Run every step inside `tx`. The caller commits.
pub fn execute(tx: &Transaction<'_>, plan: &Plan) -> rusqlite::Result<()> {
  let mut node_created = vec![false; plan.nodes.len()];
  let mut edge_created = vec![false; plan.edges.len()];

  for step in &plan.steps {
    match step {
      Step::MergeNode(index) => {
        let node = &plan.nodes[*index];
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO nodes (label, node_key, props) VALUES (?1, ?2, ?2)",
          rusqlite::params![node.label, node.key],
        )?;
        node_created[*index] = inserted == 1;
      }
      Step::MergeEdge(index) => {
        let e = &plan.edges[*index];
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO edges (rel_type, src_label, src_key, dst_label, dst_key)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![e.rel, e.src.label, e.src.key, e.dst.label, e.dst.key],
        )?;
        edge_created[*index] = inserted == 1;
      }
      Step::OnCreate(target, patch) => {
        let created = match target {
          Target::Node(index) => node_created[*index],
          Target::Edge(index) => edge_created[*index],
        };
        if created {
          apply_patch(tx, plan, *target, patch)?;
        }
      }
      Step::Set(target, patch) => apply_patch(tx, plan, *target, patch)?,
    }
  }

  Ok(())
}

fn apply_patch(
  tx: &Transaction<'_>,
  plan: &Plan,
  target: Target,
  patch: &str,
) -> rusqlite::Result<()> {
  match target {
    Target::Node(index) => {
      let node = &plan.nodes[index];
      tx.execute(
        "UPDATE nodes SET props = json_patch(props, ?3)
         WHERE label = ?1 AND node_key = ?2",
        rusqlite::params![node.label, node.key, patch],
      )?;
    }
    Target::Edge(index) => {
      let e = &plan.edges[index];
      tx.execute(
        "UPDATE edges SET props = json_patch(props, ?6)
         WHERE rel_type = ?1
           AND src_label = ?2 AND src_key = ?3
           AND dst_label = ?4 AND dst_key = ?5",
        rusqlite::params![e.rel, e.src.label, e.src.key, e.dst.label, e.dst.key, patch],
      )?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use nta_core::graph::NodeKind;

  use super::*;

  #[test]
  fn plan_resolves_edge_endpoints() {
    let statement = Statement::new()
      .merge("a", NodeRef::of(NodeKind::Token, "t1"))
      .merge("b", NodeRef::of(NodeKind::Form, "f1"))
      .relate("r", "a", RelType::InstanceOfForm, "b")
      .set("r", Props::new().with("weight", 1));

    let plan = plan(&statement).unwrap();
    assert_eq!(plan.nodes.len(), 2);
    assert_eq!(plan.edges[0].rel, "INSTANCE_OF_FORM");
    assert_eq!(plan.edges[0].src.key, r#"{"token_id":"t1"}"#);
    assert_eq!(plan.edges[0].dst.label, "Form");
    assert_eq!(plan.steps.last(), Some(&Step::Set(Target::Edge(0), r#"{"weight":1}"#.into())));
  }

  #[test]
  fn plan_rejects_unbound_variables() {
    let statement = Statement::new()
      .merge("a", NodeRef::of(NodeKind::Token, "t1"))
      .relate("r", "a", RelType::InstanceOfForm, "missing");
    assert!(matches!(plan(&statement), Err(Error::UnboundVariable("missing"))));

    let statement = Statement::new().set("x", Props::new().with("k", 1));
    assert!(matches!(plan(&statement), Err(Error::UnboundVariable("x"))));
  }

  #[test]
  fn edges_cannot_be_endpoints() {
    let statement = Statement::new()
      .merge("a", NodeRef::of(NodeKind::Token, "t1"))
      .merge("b", NodeRef::of(NodeKind::Form, "f1"))
      .relate("r", "a", RelType::InstanceOfForm, "b")
      .relate("s", "r", RelType::Realizes, "b");
    assert!(matches!(plan(&statement), Err(Error::UnboundVariable("r"))));
  }
}
