//! View capability: a named bundle of filters, toggles and node positions
//!
//! The adapter reads filters and toggles and reads/writes positions through
//! the `View` trait. `StoredView` keeps a view as a system document.

mod stored;

pub use stored::StoredView;

use crate::graph::{Node, NodeId, Position};
use crate::storage::StorageResult;
use std::collections::HashMap;

/// Toggle: draw edges discovered purely between neighbours
pub const SHOW_INTER_NEIGHBOUR_EDGES: &str = "show_inter_neighbour_edges";

/// Toggle: physics simulation enabled (nodes with positions stay movable)
pub const PHYSICS_MODE: &str = "physics_mode";

/// Config key: neighbourhood depth
pub const NEIGHBOURHOOD_SCOPE: &str = "neighbourhood_scope";

pub type Positions = HashMap<NodeId, Position>;

pub trait View: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the view is persisted
    fn exists(&self) -> bool;

    fn node_filter(&self) -> Option<String>;

    fn edge_filter(&self) -> Option<String>;

    fn config(&self, key: &str) -> Option<String>;

    fn is_enabled(&self, toggle: &str) -> bool;

    fn positions(&self) -> Positions;

    fn set_positions(&self, positions: Positions) -> StorageResult<()>;

    /// Register a freshly inserted node with the view
    fn add_node(&self, node: &Node) -> StorageResult<()>;

    /// Configured neighbourhood depth; unparsable values count as 0
    fn neighbourhood_scope(&self) -> usize {
        self.config(NEIGHBOURHOOD_SCOPE)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
}
