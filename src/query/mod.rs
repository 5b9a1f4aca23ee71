//! Traversal Engine
//!
//! Builds adjacency lists over the normalized edges and computes bounded
//! breadth-first neighbourhoods of document sets.

mod traverse;
mod types;

pub use traverse::{NeighbourhoodQuery, Traversal};
pub use types::{AdjacencyList, Direction};
