//! Directed acyclic graph over named variables.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::common::error::{RiskError, RiskResult};

/// Directed acyclic graph keeping nodes and edges in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DagRepr", into = "DagRepr")]
pub struct Dag {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

#[derive(Serialize, Deserialize)]
struct DagRepr {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

impl TryFrom<DagRepr> for Dag {
    type Error = RiskError;

    fn try_from(repr: DagRepr) -> RiskResult<Self> {
        let mut dag = Dag::new();
        for node in repr.nodes {
            dag.add_node(node);
        }
        for (parent, child) in repr.edges {
            dag.add_edge(parent, child)?;
        }
        Ok(dag)
    }
}

impl From<Dag> for DagRepr {
    fn from(dag: Dag) -> Self {
        Self {
            nodes: dag.nodes,
            edges: dag.edges,
        }
    }
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(parent, child)` pairs. Nodes are created on first mention.
    pub fn from_edges<I, P, C>(edges: I) -> RiskResult<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let mut dag = Dag::new();
        for (parent, child) in edges {
            dag.add_edge(parent, child)?;
        }
        Ok(dag)
    }

    /// Add an isolated node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.nodes.push(name);
        }
    }

    /// Add `parent -> child`, rejecting self loops, duplicates and cycles.
    pub fn add_edge(&mut self, parent: impl Into<String>, child: impl Into<String>) -> RiskResult<()> {
        let parent = parent.into();
        let child = child.into();
        if parent == child {
            return Err(RiskError::invalid(format!("self loop on {parent}")));
        }
        if self.edges.iter().any(|(p, c)| *p == parent && *c == child) {
            return Err(RiskError::invalid(format!("duplicate edge {parent} -> {child}")));
        }
        if self.reaches(&child, &parent) {
            return Err(RiskError::invalid(format!(
                "edge {parent} -> {child} would create a cycle"
            )));
        }
        self.add_node(parent.clone());
        self.add_node(child.clone());
        self.edges.push((parent, child));
        Ok(())
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    /// Parents of `node`, in edge insertion order.
    pub fn parents(&self, node: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, c)| c == node)
            .map(|(p, _)| p.as_str())
            .collect()
    }

    /// Children of `node`, in edge insertion order.
    pub fn children(&self, node: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(p, _)| p == node)
            .map(|(_, c)| c.as_str())
            .collect()
    }

    /// Kahn ordering; ties resolved by node insertion order.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut indegree: Vec<usize> = self
            .nodes
            .iter()
            .map(|n| self.parents(n).len())
            .collect();
        let mut ready: VecDeque<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(idx) = ready.pop_front() {
            let node = self.nodes[idx].as_str();
            order.push(node);
            for child in self.children(node) {
                if let Some(child_idx) = self.nodes.iter().position(|n| n == child) {
                    indegree[child_idx] -= 1;
                    if indegree[child_idx] == 0 {
                        ready.push_back(child_idx);
                    }
                }
            }
        }
        order
    }

    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if seen.insert(node) {
                stack.extend(self.children(node));
            }
        }
        false
    }
}
