//! Dependency graph - construction, cycle detection, deterministic walks.
//!
//! Nodes are labels; edges point from a target to each of its declared
//! dependencies, in declaration order. The graph is append-only while the
//! workspace is configured and read-only afterwards.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::label::Label;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Gray,
    Black,
}

/// The directed dependency graph over all registered targets.
///
/// petgraph stores the nodes; walks use the side adjacency lists because
/// petgraph's neighbor iteration runs in reverse insertion order, and
/// traversal must follow `deps` declaration order.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Label, ()>,
    node_of: HashMap<Label, NodeIndex>,
    adjacency: Vec<Vec<NodeIndex>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph::default()
    }

    /// Add a node for a label; repeated adds return the existing node.
    pub fn add_node(&mut self, label: Label) -> NodeIndex {
        if let Some(&node) = self.node_of.get(&label) {
            return node;
        }
        let node = self.graph.add_node(label);
        self.node_of.insert(label, node);
        self.adjacency.push(Vec::new());
        node
    }

    /// Add a dependency edge; both labels must already have nodes.
    pub fn add_edge(&mut self, from: Label, to: Label) {
        let from = self.node_of[&from];
        let to = self.node_of[&to];
        self.graph.add_edge(from, to, ());
        self.adjacency[from.index()].push(to);
    }

    /// Whether a label has a node.
    pub fn contains(&self, label: Label) -> bool {
        self.node_of.contains_key(&label)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Direct dependencies in declaration order.
    pub fn direct_dependencies(&self, label: Label) -> Vec<Label> {
        match self.node_of.get(&label) {
            Some(&node) => self.adjacency[node.index()]
                .iter()
                .map(|&n| self.graph[n])
                .collect(),
            None => Vec::new(),
        }
    }

    /// The reflexive-transitive dependency closure of `label`, excluding
    /// `label` itself, duplicate-free, in post-order over a stable DFS
    /// with ties broken by `deps` declaration order.
    pub fn all_dependencies(&self, label: Label) -> Vec<Label> {
        let Some(&start) = self.node_of.get(&label) else {
            return Vec::new();
        };
        let mut visited = vec![false; self.graph.node_count()];
        visited[start.index()] = true;
        let mut order = Vec::new();
        self.post_order(start, &mut visited, &mut order);
        order.into_iter().map(|n| self.graph[n]).collect()
    }

    fn post_order(&self, node: NodeIndex, visited: &mut [bool], order: &mut Vec<NodeIndex>) {
        for &child in &self.adjacency[node.index()] {
            if !visited[child.index()] {
                visited[child.index()] = true;
                self.post_order(child, visited, order);
                order.push(child);
            }
        }
    }

    /// Every node of the graph, dependencies before dependents, with the
    /// tie-break following node insertion and declaration order.
    pub fn topological_order(&self) -> Vec<Label> {
        let mut visited = vec![false; self.graph.node_count()];
        let mut order = Vec::new();
        for index in 0..self.graph.node_count() {
            let node = NodeIndex::new(index);
            if !visited[index] {
                visited[index] = true;
                self.post_order(node, &mut visited, &mut order);
                order.push(node);
            }
        }
        order.into_iter().map(|n| self.graph[n]).collect()
    }

    /// DFS colouring cycle check; reports the offending cycle path.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let mut colour = vec![Colour::White; self.graph.node_count()];
        let mut path = Vec::new();
        for index in 0..self.graph.node_count() {
            if colour[index] == Colour::White {
                self.colour_dfs(NodeIndex::new(index), &mut colour, &mut path)?;
            }
        }
        Ok(())
    }

    fn colour_dfs(
        &self,
        node: NodeIndex,
        colour: &mut [Colour],
        path: &mut Vec<NodeIndex>,
    ) -> Result<()> {
        colour[node.index()] = Colour::Gray;
        path.push(node);
        for &child in &self.adjacency[node.index()] {
            match colour[child.index()] {
                Colour::Gray => {
                    let first = path
                        .iter()
                        .position(|&n| n == child)
                        .expect("gray node is on the active path");
                    let cycle = path[first..]
                        .iter()
                        .chain(std::iter::once(&child))
                        .map(|&n| self.graph[n].to_string())
                        .collect();
                    return Err(Error::DependencyCycle { cycle });
                }
                Colour::White => self.colour_dfs(child, colour, path)?,
                Colour::Black => {}
            }
        }
        path.pop();
        colour[node.index()] = Colour::Black;
        Ok(())
    }
}
