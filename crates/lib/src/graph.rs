//! Project-wide dependency graph.
//!
//! Nodes are source files (or registered module names, which never have
//! outgoing edges). An edge `a -> b` means "a requires b". Edges are inserted
//! first and verified afterwards: the cycle report must contain the edge that
//! closed the cycle, and a cycle aborts the whole build anyway.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tracing::trace;

/// A dependency cycle, as the chain of nodes from the requiring file back to itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle: {}", chain.join(" -> "))]
pub struct DependencyCycle {
  /// Nodes in traversal order; the first and last entries are the same node.
  pub chain: Vec<String>,
}

/// Directed "requires" graph with cycle detection on insertion.
#[derive(Debug, Default)]
pub struct DependencyGraph {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
  /// Create a new empty graph.
  pub fn new() -> Self {
    Self::default()
  }

  fn node(&mut self, name: &str) -> NodeIndex {
    if let Some(&idx) = self.nodes.get(name) {
      return idx;
    }
    let idx = self.graph.add_node(name.to_string());
    self.nodes.insert(name.to_string(), idx);
    idx
  }

  /// Record that `from` requires `to`, then check that no path leads from
  /// `to` back to `from`.
  ///
  /// The edge stays in the graph even when a cycle is reported.
  pub fn register_edge(&mut self, from: &str, to: &str) -> Result<(), DependencyCycle> {
    let from_idx = self.node(from);
    let to_idx = self.node(to);
    self.graph.update_edge(from_idx, to_idx, ());
    trace!(from, to, "registered dependency edge");

    match self.find_path(to_idx, from_idx) {
      Some(path) => {
        let mut chain = Vec::with_capacity(path.len() + 1);
        chain.push(from.to_string());
        chain.extend(path.into_iter().map(|idx| self.graph[idx].clone()));
        Err(DependencyCycle { chain })
      }
      None => Ok(()),
    }
  }

  /// Successors of a node in insertion order.
  fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut next: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Outgoing).collect();
    // petgraph yields the most recently added edge first
    next.reverse();
    next
  }

  /// Iterative depth-first search for a path `start ..= goal`.
  fn find_path(&self, start: NodeIndex, goal: NodeIndex) -> Option<Vec<NodeIndex>> {
    if start == goal {
      return Some(vec![start]);
    }

    let mut visited = HashSet::from([start]);
    let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = vec![(start, self.successors(start), 0)];

    while let Some((_, next, cursor)) = stack.last_mut() {
      let Some(&candidate) = next.get(*cursor) else {
        stack.pop();
        continue;
      };
      *cursor += 1;

      if candidate == goal {
        let mut path: Vec<NodeIndex> = stack.iter().map(|(idx, _, _)| *idx).collect();
        path.push(goal);
        return Some(path);
      }

      if visited.insert(candidate) {
        let successors = self.successors(candidate);
        stack.push((candidate, successors, 0));
      }
    }

    None
  }

  /// Direct dependencies of a node, in insertion order.
  pub fn dependencies(&self, name: &str) -> Vec<&str> {
    self
      .nodes
      .get(name)
      .map(|&idx| {
        self
          .successors(idx)
          .into_iter()
          .map(|dep| self.graph[dep].as_str())
          .collect()
      })
      .unwrap_or_default()
  }

  /// Check whether the edge `from -> to` was registered.
  pub fn contains_edge(&self, from: &str, to: &str) -> bool {
    match (self.nodes.get(from), self.nodes.get(to)) {
      (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
      _ => false,
    }
  }

  /// All nodes ordered so that dependencies come before their dependents.
  ///
  /// Returns the cycle-free order, or `None` if the graph holds a cycle.
  pub fn build_order(&self) -> Option<Vec<String>> {
    let sorted = toposort(&self.graph, None).ok()?;
    Some(sorted.into_iter().rev().map(|idx| self.graph[idx].clone()).collect())
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }
}
