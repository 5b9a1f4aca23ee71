//! Traversal types

use crate::graph::{Edge, NodeId};
use std::collections::HashMap;

/// Endpoint an adjacency list is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Key by source: outgoing edges per node
    #[default]
    From,
    /// Key by target: incoming edges per node
    To,
}

impl Direction {
    /// The endpoint of an edge this direction groups by
    pub fn endpoint<'a>(&self, edge: &'a Edge) -> &'a NodeId {
        match self {
            Self::From => &edge.from,
            Self::To => &edge.to,
        }
    }
}

/// Edges grouped by one endpoint, sorted by edge id within a group
pub type AdjacencyList = HashMap<NodeId, Vec<Edge>>;
