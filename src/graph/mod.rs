//! Core graph data structures

mod edge;
mod edge_type;
mod node;
mod subgraph;


pub use edge::{Edge, EdgeAction, EdgeId, EdgeSpec};
pub use edge_type::{EdgeType, EdgeTypeId, Namespace};
pub use node::{Fixed, Font, Node, NodeId, NodeTemplate, Position};
pub use subgraph::{EdgeMap, Graph, NodeMap};
