//! Dependency index between formula-typed named values.
//!
//! Built once per evaluation from the formula texts effective on a page, then
//! walked to detect circular references before any value is substituted.

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

use super::refs::unique_references;

#[derive(Debug, Default, Clone)]
pub struct DependencyIndex {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
  cyclic: OnceCell<bool>,
}

impl DependencyIndex {
  pub fn new() -> Self {
    Self::default()
  }

  fn node(&mut self, name: &str) -> NodeIndex {
    if let Some(idx) = self.nodes.get(name) {
      return *idx;
    }
    let idx = self.graph.add_node(name.to_string());
    self.nodes.insert(name.to_string(), idx);
    idx
  }

  /// Record that the formula named `name` reads every value referenced in `text`.
  pub fn add_formula(&mut self, name: &str, text: &str) {
    let from = self.node(name);
    for dep in unique_references(text) {
      let to = self.node(dep);
      self.graph.update_edge(from, to, ());
    }
    self.cyclic = OnceCell::new();
  }

  /// Names `name` references directly, in no particular order.
  pub fn dependencies(&self, name: &str) -> Vec<&str> {
    match self.nodes.get(name) {
      Some(idx) => self.graph.neighbors(*idx).map(|n| self.graph[n].as_str()).collect(),
      None => Vec::new(),
    }
  }

  /// Whether any cycle exists anywhere in the index. Computed once per
  /// set of formulas.
  pub fn has_cycle(&self) -> bool {
    *self.cyclic.get_or_init(|| is_cyclic_directed(&self.graph))
  }

  /// Walk everything reachable from `start` and return the first cycle found,
  /// as the chain of names ending where it began (`a -> b -> a`).
  pub fn find_cycle(&self, start: &str) -> Option<Vec<String>> {
    if !self.has_cycle() {
      return None;
    }
    let start = *self.nodes.get(start)?;
    let mut path = Vec::new();
    let mut on_path = HashSet::new();
    let mut cleared = HashSet::new();
    self.walk(start, &mut path, &mut on_path, &mut cleared)
  }

  fn walk(
    &self,
    node: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut HashSet<NodeIndex>,
    cleared: &mut HashSet<NodeIndex>,
  ) -> Option<Vec<String>> {
    if on_path.contains(&node) {
      let from = path.iter().position(|n| *n == node).unwrap_or(0);
      let mut chain: Vec<String> = path[from..].iter().map(|n| self.graph[*n].clone()).collect();
      chain.push(self.graph[node].clone());
      return Some(chain);
    }
    // A node whose whole subtree was already walked cannot lead to a cycle.
    if cleared.contains(&node) {
      return None;
    }

    path.push(node);
    on_path.insert(node);
    for next in self.graph.neighbors(node) {
      if let Some(chain) = self.walk(next, path, on_path, cleared) {
        return Some(chain);
      }
    }
    on_path.remove(&node);
    path.pop();
    cleared.insert(node);
    None
  }
}
