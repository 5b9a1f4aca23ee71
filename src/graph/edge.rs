//! Edge representation shared by all physical encodings

use super::edge_type::EdgeTypeId;
use super::node::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Namespace for content-hash edge ids (UUID v5)
const DERIVED_EDGE_NS: Uuid = Uuid::from_bytes([
    0x3f, 0x1d, 0x6a, 0x52, 0x8e, 0x4b, 0x4c, 0x11,
    0x9a, 0x07, 0x5e, 0xd2, 0x41, 0xc8, 0x90, 0x3b,
]);

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Content hash id for encodings that cannot persist an id
    ///
    /// Stable across calls: the same `(type, from, to)` always yields the
    /// same id.
    pub fn derived(edge_type: &EdgeTypeId, from_ref: &str, to_ref: &str) -> Self {
        let input = format!("{}\u{1f}{}\u{1f}{}", edge_type.as_str(), from_ref, to_ref);
        Self(Uuid::new_v5(&DERIVED_EDGE_NS, input.as_bytes()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A typed directed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeTypeId,
    /// Tooltip, taken from the type description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Set only when the type shows its label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Style attributes of the edge type
    #[serde(flatten)]
    pub style: Map<String, Value>,
}

/// An edge descriptor as received from consumers
///
/// Mutations validate presence of the individual parts: `from` and
/// `edge_type` are always required, `to` on insert, `id` when deleting a
/// stored edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NodeId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeTypeId>,
}

impl EdgeSpec {
    pub fn new(
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        edge_type: impl Into<EdgeTypeId>,
    ) -> Self {
        Self {
            id: None,
            from: Some(from.into()),
            to: Some(to.into()),
            edge_type: Some(edge_type.into()),
        }
    }

    pub fn with_id(mut self, id: impl Into<EdgeId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<&Edge> for EdgeSpec {
    fn from(edge: &Edge) -> Self {
        Self {
            id: Some(edge.id.clone()),
            from: Some(edge.from.clone()),
            to: Some(edge.to.clone()),
            edge_type: Some(edge.edge_type.clone()),
        }
    }
}

impl From<Edge> for EdgeSpec {
    fn from(edge: Edge) -> Self {
        Self::from(&edge)
    }
}

/// Direction of an edge mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAction {
    Insert,
    Delete,
}

impl std::fmt::Display for EdgeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ids_are_stable() {
        let ty = EdgeTypeId::from("list:connections");
        assert_eq!(EdgeId::derived(&ty, "A", "B"), EdgeId::derived(&ty, "A", "B"));
    }

    #[test]
    fn derived_ids_change_with_target_or_type() {
        let ty = EdgeTypeId::from("list:connections");
        let other = EdgeTypeId::from("list:tags");
        let base = EdgeId::derived(&ty, "A", "B");
        assert_ne!(base, EdgeId::derived(&ty, "A", "C"));
        assert_ne!(base, EdgeId::derived(&other, "A", "B"));
    }

    #[test]
    fn derived_ids_do_not_collide_on_concatenation() {
        let ty = EdgeTypeId::from("list:x");
        assert_ne!(EdgeId::derived(&ty, "AB", "C"), EdgeId::derived(&ty, "A", "BC"));
    }

    #[test]
    fn spec_from_edge_keeps_all_parts() {
        let edge = Edge {
            id: EdgeId::from("e1"),
            from: NodeId::from("a1"),
            to: NodeId::from("b1"),
            edge_type: EdgeTypeId::from("likes"),
            title: None,
            label: None,
            style: Map::new(),
        };
        let spec = EdgeSpec::from(&edge);
        assert_eq!(spec.id, Some(EdgeId::from("e1")));
        assert_eq!(spec.edge_type, Some(EdgeTypeId::from("likes")));
    }
}
