//! Graph payload: the unit returned to consumers

use super::edge::{Edge, EdgeId};
use super::node::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Edge collection keyed by edge id
pub type EdgeMap = HashMap<EdgeId, Edge>;

/// Node collection keyed by node id
pub type NodeMap = HashMap<NodeId, Node>;

/// A set of nodes and the edges between them
///
/// Map order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: NodeMap,
    pub edges: EdgeMap,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(nodes: NodeMap, edges: EdgeMap) -> Self {
        Self { nodes, edges }
    }

    /// Merge another graph into this one
    ///
    /// Nodes and edges of `other` overwrite entries with the same id.
    pub fn merge(&mut self, other: Graph) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
    }

    /// Add edges without replacing ids already present
    pub fn add_edges(&mut self, edges: EdgeMap) {
        for (id, edge) in edges {
            self.edges.entry(id).or_insert(edge);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Sorted node ids
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Sorted edge ids
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self.edges.keys().cloned().collect();
        ids.sort();
        ids
    }
}
