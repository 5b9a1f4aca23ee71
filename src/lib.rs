//! docgraph: a schema-less document store seen as a typed, attributed graph
//!
//! Documents become nodes with stable ids distinct from their titles.
//! Edges are read from several physical encodings at once and normalized
//! into one shape.
//!
//! # Core Concepts
//!
//! - **Nodes**: live documents, identified by an id persisted in a field
//! - **Edges**: typed relationships kept as stored edge maps, list fields,
//!   single-value fields or links in the document content
//! - **Views**: persisted bundles of filters, toggles and node positions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use docgraph::{AdapterConfig, Document, EdgeSpec, GraphAdapter, MemoryStore};
//!
//! let store = MemoryStore::with_documents([
//!     Document::new("A").with_field("tmap.id", "a1"),
//!     Document::new("B").with_field("tmap.id", "b1"),
//! ]);
//! let adapter = GraphAdapter::new(Arc::new(store), AdapterConfig::default());
//! adapter.rebuild_index().unwrap();
//! adapter.insert_edge(&EdgeSpec::new("a1", "b1", "likes")).unwrap();
//! assert_eq!(adapter.get_edges("A").unwrap().len(), 1);
//! ```

pub mod adapter;
pub mod codec;
pub mod config;
mod graph;
pub mod index;
pub mod query;
pub mod select;
pub mod storage;
pub mod view;

pub use adapter::{GraphAdapter, GraphOptions};
pub use codec::{EdgeTypeRegistry, EdgeWhitelist};
pub use config::{AdapterConfig, ConfigError};
pub use graph::{
    Edge, EdgeAction, EdgeId, EdgeMap, EdgeSpec, EdgeType, EdgeTypeId, Fixed, Font, Graph,
    Namespace, Node, NodeId, NodeMap, NodeTemplate, Position,
};
pub use index::IdentityIndex;
pub use query::{Direction, NeighbourhoodQuery};
pub use select::{Selector, SimpleSelector};
pub use storage::{
    Document, DocumentStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult,
};
pub use view::{Positions, StoredView, View};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
