//! Document-backed view

use super::{Positions, View};
use crate::graph::Node;
use crate::storage::{set_field, Document, DocumentStore, StorageResult};
use std::sync::{Arc, RwLock};

const NODE_FILTER_FIELD: &str = "node-filter";
const EDGE_FILTER_FIELD: &str = "edge-filter";
const POSITIONS_FIELD: &str = "positions";

/// A view persisted as the document `<views path>/<name>`
///
/// The document is read once on open; setters write through to the store
/// and refresh the snapshot.
pub struct StoredView {
    store: Arc<dyn DocumentStore>,
    name: String,
    title: String,
    snapshot: RwLock<Option<Document>>,
}

impl StoredView {
    /// Open a view by name; a missing view yields a non-existent view
    pub fn open(store: Arc<dyn DocumentStore>, views_path: &str, name: &str) -> StorageResult<Self> {
        let title = format!("{}/{}", views_path, name);
        let snapshot = store.get(&title)?;
        Ok(Self {
            store,
            name: name.to_string(),
            title,
            snapshot: RwLock::new(snapshot),
        })
    }

    /// Create and persist a view with a unique name derived from the label
    pub fn create(store: Arc<dyn DocumentStore>, views_path: &str, label: &str) -> StorageResult<Self> {
        let label = if label.trim().is_empty() { "My view" } else { label };
        let title = store.generate_unique_title(&format!("{}/{}", views_path, label))?;
        let name = title
            .strip_prefix(views_path)
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or(&title)
            .to_string();
        let doc = Document::new(title.clone()).with_field(POSITIONS_FIELD, "{}");
        store.put(doc.clone())?;
        Ok(Self {
            store,
            name,
            title,
            snapshot: RwLock::new(Some(doc)),
        })
    }

    /// Title of the backing document
    pub fn title(&self) -> &str {
        &self.title
    }

    fn field(&self, name: &str) -> Option<String> {
        let snapshot = self.snapshot.read().unwrap_or_else(|p| p.into_inner());
        snapshot
            .as_ref()
            .and_then(|doc| doc.non_empty_field(name))
            .map(str::to_string)
    }

    /// Write a field through to the store, creating the view document if needed
    pub fn set(&self, name: &str, value: impl Into<String>) -> StorageResult<()> {
        let value = value.into();
        if !set_field(self.store.as_ref(), &self.title, name, value.clone())? {
            self.store
                .put(Document::new(self.title.clone()).with_field(name, value))?;
        }
        let refreshed = self.store.get(&self.title)?;
        *self.snapshot.write().unwrap_or_else(|p| p.into_inner()) = refreshed;
        Ok(())
    }

    pub fn set_node_filter(&self, filter: &str) -> StorageResult<()> {
        self.set(NODE_FILTER_FIELD, filter)
    }

    pub fn set_edge_filter(&self, filter: &str) -> StorageResult<()> {
        self.set(EDGE_FILTER_FIELD, filter)
    }

    pub fn set_enabled(&self, toggle: &str, enabled: bool) -> StorageResult<()> {
        self.set(toggle, if enabled { "true" } else { "false" })
    }
}

impl View for StoredView {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self) -> bool {
        self.snapshot
            .read()
            .map(|s| s.is_some())
            .unwrap_or_else(|p| p.into_inner().is_some())
    }

    fn node_filter(&self) -> Option<String> {
        self.field(NODE_FILTER_FIELD)
    }

    fn edge_filter(&self) -> Option<String> {
        self.field(EDGE_FILTER_FIELD)
    }

    fn config(&self, key: &str) -> Option<String> {
        self.field(key)
    }

    fn is_enabled(&self, toggle: &str) -> bool {
        self.field(toggle).is_some_and(|v| v == "true")
    }

    fn positions(&self) -> Positions {
        self.field(POSITIONS_FIELD)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    fn set_positions(&self, positions: Positions) -> StorageResult<()> {
        let json = serde_json::to_string(&positions)?;
        self.set(POSITIONS_FIELD, json)
    }

    fn add_node(&self, node: &Node) -> StorageResult<()> {
        let entry = format!("[[{}]]", node.label);
        let filter = match self.node_filter() {
            Some(existing) => format!("{} {}", existing, entry),
            None => entry,
        };
        self.set_node_filter(&filter)?;

        if let Some(position) = node.position() {
            let mut positions = self.positions();
            positions.insert(node.id.clone(), position);
            self.set_positions(positions)?;
        }
        Ok(())
    }
}
