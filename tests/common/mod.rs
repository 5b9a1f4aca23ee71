//! Common test utilities for the graph adapter tests
//!
//! Builds small document corpora in a `MemoryStore` and wraps them in an
//! adapter with a freshly built index.

#![allow(dead_code)]

use docgraph::{AdapterConfig, Document, DocumentStore, GraphAdapter, MemoryStore, NodeId};
use std::sync::Arc;

/// Id persisted for a test document: the lowercased title plus `1`
pub fn id_of(title: &str) -> NodeId {
    NodeId::from(format!("{}1", title.to_lowercase()))
}

/// A live document carrying its test id
pub fn doc(title: &str) -> Document {
    Document::new(title).with_field("tmap.id", id_of(title).as_str())
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub adapter: GraphAdapter,
}

impl Fixture {
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        Self::with_config(documents, AdapterConfig::default())
    }

    pub fn with_config(documents: impl IntoIterator<Item = Document>, config: AdapterConfig) -> Self {
        let store = Arc::new(MemoryStore::with_documents(documents));
        let adapter = GraphAdapter::new(store.clone(), config);
        adapter.rebuild_index().expect("index should build");
        Self { store, adapter }
    }

    /// Documents `A`, `B`, ... up to the given count, without edges
    pub fn letters(count: u8) -> Self {
        Self::new((b'A'..b'A' + count).map(|c| doc(&(c as char).to_string())))
    }

    pub fn field(&self, title: &str, name: &str) -> Option<String> {
        self.store
            .get(title)
            .expect("store read")
            .and_then(|d| d.field(name).map(str::to_string))
    }
}
