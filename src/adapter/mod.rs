//! Graph adapter: presents a document store as a typed, attributed graph
//!
//! `GraphAdapter` is the single entry point for consumers. It owns the
//! identity index and wires the edge store, the materializer and the
//! traversal engine to the store, selector and configuration it is given.

mod assemble;
mod edge_store;
mod materialize;

pub use assemble::GraphOptions;
pub use edge_store::EdgeStore;
pub use materialize::{contrast_colour, image_data_uri, make_edge, Materializer};

use crate::codec::{CodecContext, EdgeTypeRegistry, EdgeWhitelist};
use crate::config::AdapterConfig;
use crate::graph::{
    Edge, EdgeAction, EdgeMap, EdgeSpec, EdgeType, EdgeTypeId, Node, NodeId, NodeMap,
    NodeTemplate, Position,
};
use crate::index::IdentityIndex;
use crate::query::{NeighbourhoodQuery, Traversal};
use crate::select::{Selector, SimpleSelector};
use crate::storage::{timestamp, Document, DocumentStore, StorageResult};
use crate::view::{Positions, StoredView, View};
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_NODE_LABEL: &str = "New node";

/// Single entry point for all consumer-facing graph operations
///
/// Assumes exclusive access to the store for the duration of each call;
/// mutations are best-effort and never rolled back.
pub struct GraphAdapter {
    store: Arc<dyn DocumentStore>,
    config: Arc<AdapterConfig>,
    index: Arc<IdentityIndex>,
    registry: EdgeTypeRegistry,
    selector: Arc<dyn Selector>,
    edges: EdgeStore,
    materializer: Materializer,
}

impl GraphAdapter {
    /// Create an adapter using the built-in selector
    pub fn new(store: Arc<dyn DocumentStore>, config: AdapterConfig) -> Self {
        let selector = Arc::new(SimpleSelector::new(store.clone()));
        Self::with_selector(store, config, selector)
    }

    pub fn with_selector(
        store: Arc<dyn DocumentStore>,
        config: AdapterConfig,
        selector: Arc<dyn Selector>,
    ) -> Self {
        let config = Arc::new(config);
        let index = Arc::new(IdentityIndex::new(store.clone(), config.fields.node_id.clone()));
        let registry = EdgeTypeRegistry::new(store.clone(), config.paths.edge_types.clone());
        let ctx = CodecContext::new(store.clone(), index.clone(), registry.clone());
        let edges = EdgeStore::new(ctx, config.clone());
        let materializer = Materializer::new(store.clone(), index.clone(), config.clone());

        Self {
            store,
            config,
            index,
            registry,
            selector,
            edges,
            materializer,
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn index(&self) -> &IdentityIndex {
        &self.index
    }

    pub fn registry(&self) -> &EdgeTypeRegistry {
        &self.registry
    }

    fn traversal(&self) -> Traversal<'_> {
        Traversal {
            edges: &self.edges,
            materializer: &self.materializer,
            selector: self.selector.as_ref(),
            all_potential_nodes: &self.config.selectors.all_potential_nodes,
        }
    }

    fn all_potential_nodes(&self) -> StorageResult<Vec<String>> {
        self.selector
            .evaluate(&self.config.selectors.all_potential_nodes, None)
    }

    // --- Identity ---

    /// Assign and register ids for all potential nodes
    pub fn rebuild_index(&self) -> StorageResult<usize> {
        let titles = self.all_potential_nodes()?;
        let count = self.index.rebuild(&titles)?;
        debug!(count, "rebuilt identity index");
        Ok(count)
    }

    /// Titles of the live documents behind a set of ids
    pub fn nodes_refs_by_ids<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a NodeId>,
    ) -> StorageResult<Vec<String>> {
        self.index.resolve_refs(ids)
    }

    // --- Edges ---

    /// All outgoing edges of a document
    pub fn get_edges(&self, title: &str) -> StorageResult<EdgeMap> {
        self.edges.outgoing_edges(title, &EdgeWhitelist::any())
    }

    /// Outgoing edges of a document, restricted by the whitelist
    pub fn outgoing_edges(&self, title: &str, whitelist: &EdgeWhitelist) -> StorageResult<EdgeMap> {
        self.edges.outgoing_edges(title, whitelist)
    }

    /// Union of the outgoing edges of many documents
    pub fn edges_for_set<S: AsRef<str>>(
        &self,
        titles: &[S],
        whitelist: &EdgeWhitelist,
    ) -> StorageResult<EdgeMap> {
        self.edges.edges_for_set(titles, whitelist)
    }

    /// Every edge of one type across all potential nodes
    pub fn select_edges_by_type(&self, edge_type: &EdgeTypeId) -> StorageResult<EdgeMap> {
        let titles = self.all_potential_nodes()?;
        let whitelist = EdgeWhitelist::any().with_types([edge_type.clone()]);
        self.edges.edges_for_set(&titles, &whitelist)
    }

    pub fn insert_edge(&self, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        self.edges.process_edge(edge, EdgeAction::Insert)
    }

    pub fn delete_edge(&self, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        self.edges.process_edge(edge, EdgeAction::Delete)
    }

    /// Delete each edge independently, returning how many were removed
    ///
    /// A failing element is logged and skipped.
    pub fn delete_edges<'a>(&self, edges: impl IntoIterator<Item = &'a EdgeSpec>) -> usize {
        let mut removed = 0;
        for edge in edges {
            match self.delete_edge(edge) {
                Ok(Some(_)) => removed += 1,
                Ok(None) => {}
                Err(e) => warn!(error = %e, id = ?edge.id, "failed to delete edge"),
            }
        }
        removed
    }

    /// Rename a type: re-key all its edges and move its definition
    ///
    /// Stored edges keep their ids. Not atomic: a failure leaves the edges
    /// processed so far under the new type. Renaming a type to itself does
    /// nothing.
    pub fn rename_edge_type(&self, old: &EdgeTypeId, new: &EdgeTypeId) -> StorageResult<usize> {
        if old == new {
            return Ok(0);
        }
        let old_type = self.registry.get(old)?;
        let mut new_type = EdgeType::new(new.clone());
        new_type.load_data_from(&old_type);
        self.registry.persist(&new_type)?;

        let count = self.process_edges_with_type(old, Some(new))?;
        self.registry.remove(old)?;
        debug!(old = %old, new = %new, count, "renamed edge type");
        Ok(count)
    }

    /// Delete every edge of a type, then its definition
    pub fn delete_edge_type(&self, edge_type: &EdgeTypeId) -> StorageResult<usize> {
        let count = self.process_edges_with_type(edge_type, None)?;
        self.registry.remove(edge_type)?;
        debug!(edge_type = %edge_type, count, "deleted edge type");
        Ok(count)
    }

    fn process_edges_with_type(
        &self,
        edge_type: &EdgeTypeId,
        rename_to: Option<&EdgeTypeId>,
    ) -> StorageResult<usize> {
        let edges = self.select_edges_by_type(edge_type)?;
        let mut processed = 0;
        for edge in edges.values() {
            let mut spec = EdgeSpec::from(edge);
            let result = self.delete_edge(&spec).and_then(|deleted| match rename_to {
                Some(new) => {
                    spec.edge_type = Some(new.clone());
                    self.insert_edge(&spec).map(|inserted| inserted.or(deleted))
                }
                None => Ok(deleted),
            });
            match result {
                Ok(Some(_)) => processed += 1,
                Ok(None) => {}
                Err(e) => warn!(error = %e, edge = %edge.id, "failed to process edge"),
            }
        }
        Ok(processed)
    }

    // --- Nodes ---

    /// Build the node of one document
    pub fn make_node(
        &self,
        title: &str,
        overrides: Option<&NodeTemplate>,
        view: Option<&dyn View>,
    ) -> StorageResult<Option<Node>> {
        self.materializer.make_node(title, overrides, view)
    }

    pub fn select_nodes_by_filter(
        &self,
        filter: &str,
        overrides: Option<&NodeTemplate>,
        view: Option<&dyn View>,
    ) -> StorageResult<NodeMap> {
        let titles = self.selector.evaluate(filter, None)?;
        self.materializer.select_by_refs(&titles, overrides, view)
    }

    pub fn select_nodes_by_references<S: AsRef<str>>(
        &self,
        titles: &[S],
        overrides: Option<&NodeTemplate>,
        view: Option<&dyn View>,
    ) -> StorageResult<NodeMap> {
        self.materializer.select_by_refs(titles, overrides, view)
    }

    pub fn select_nodes_by_ids(
        &self,
        ids: &[NodeId],
        overrides: Option<&NodeTemplate>,
        view: Option<&dyn View>,
    ) -> StorageResult<NodeMap> {
        let titles = self.index.resolve_refs(ids)?;
        self.materializer.select_by_refs(&titles, overrides, view)
    }

    pub fn select_node_by_id(
        &self,
        id: &NodeId,
        overrides: Option<&NodeTemplate>,
        view: Option<&dyn View>,
    ) -> StorageResult<Option<Node>> {
        let mut nodes = self.select_nodes_by_ids(std::slice::from_ref(id), overrides, view)?;
        Ok(nodes.remove(id))
    }

    /// Create a document for a new node
    ///
    /// The title is made unique from the label (default `New node`) and
    /// becomes the node label. A fresh id is always assigned. With a view,
    /// the node is added to it.
    pub fn insert_node(
        &self,
        label: Option<&str>,
        position: Option<Position>,
        view: Option<&dyn View>,
    ) -> StorageResult<Node> {
        let base = label.filter(|l| !l.trim().is_empty()).unwrap_or(DEFAULT_NODE_LABEL);
        let title = self.store.generate_unique_title(base)?;

        let now = timestamp();
        let mut doc = Document::new(title.clone())
            .with_field("created", now.clone())
            .with_field("modified", now);
        let id = if self.index.is_title_identity() {
            NodeId::from(title.as_str())
        } else {
            let id = NodeId::new();
            doc.set_field(self.index.id_field(), id.as_str());
            id
        };
        self.store.put(doc)?;
        self.index.assign(&title, false)?;

        let mut node = Node::new(id, title);
        if let Some(position) = position {
            node.set_position(position);
        }
        if let Some(view) = view {
            view.add_node(&node)?;
        }
        debug!(title = %node.label, id = %node.id, "inserted node");
        Ok(node)
    }

    /// Delete a node's document and every edge connected to it
    ///
    /// The index entry of the node is kept. Returns false if the id does not
    /// resolve to a live document.
    pub fn delete_node(&self, id: &NodeId) -> StorageResult<bool> {
        let Some(title) = self.index.resolve_ref(id)? else {
            return Ok(false);
        };

        let neighbourhood = self.get_neighbours(&NeighbourhoodQuery::from([title.clone()]), None)?;
        let specs: Vec<EdgeSpec> = neighbourhood.edges.values().map(EdgeSpec::from).collect();
        let removed = self.delete_edges(&specs);

        let deleted = self.store.delete(&title)?;
        debug!(title = %title, edges = removed, "deleted node");
        Ok(deleted)
    }

    // --- Views ---

    /// Create a view with a unique name derived from the label
    pub fn create_view(&self, label: &str) -> StorageResult<StoredView> {
        StoredView::create(self.store.clone(), &self.config.paths.views, label)
    }

    /// Open a view by name; it may not exist
    pub fn get_view(&self, name: &str) -> StorageResult<StoredView> {
        StoredView::open(self.store.clone(), &self.config.paths.views, name)
    }

    pub fn store_positions(&self, positions: Positions, view: &dyn View) -> StorageResult<()> {
        view.set_positions(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn adapter() -> GraphAdapter {
        let store = MemoryStore::with_documents([
            Document::new("A").with_field("tmap.id", "a1"),
            Document::new("B").with_field("tmap.id", "b1"),
            Document::new("C").with_field("tmap.id", "c1"),
        ]);
        let adapter = GraphAdapter::new(Arc::new(store), AdapterConfig::default());
        adapter.rebuild_index().unwrap();
        adapter
    }

    // === Scenario: stored edge A likes B ===
    #[test]
    fn stored_edge_lifecycle() {
        let adapter = adapter();
        let edge = adapter
            .insert_edge(&EdgeSpec::new("a1", "b1", "likes"))
            .unwrap()
            .unwrap();

        let edges = adapter.get_edges("A").unwrap();
        assert_eq!(edges.len(), 1);
        let found = &edges[&edge.id];
        assert_eq!(found.from, NodeId::from("a1"));
        assert_eq!(found.to, NodeId::from("b1"));
        assert_eq!(found.edge_type, EdgeTypeId::from("likes"));

        adapter.delete_edge(&EdgeSpec::from(&edge)).unwrap();
        assert!(adapter.get_edges("A").unwrap().is_empty());
    }

    #[test]
    fn delete_edges_counts_removals() {
        let adapter = adapter();
        let e1 = adapter.insert_edge(&EdgeSpec::new("a1", "b1", "likes")).unwrap().unwrap();
        let e2 = adapter.insert_edge(&EdgeSpec::new("a1", "c1", "likes")).unwrap().unwrap();
        let bogus = EdgeSpec::new("a1", "c1", "likes").with_id("nope");

        let specs = vec![EdgeSpec::from(&e1), bogus, EdgeSpec::from(&e2)];
        assert_eq!(adapter.delete_edges(&specs), 2);
        assert!(adapter.get_edges("A").unwrap().is_empty());
    }

    #[test]
    fn rename_edge_type_rekeys_edges() {
        let adapter = adapter();
        adapter
            .registry()
            .persist(&EdgeType::new("likes").with_description("fond of"))
            .unwrap();
        let stored = adapter.insert_edge(&EdgeSpec::new("a1", "b1", "likes")).unwrap().unwrap();

        let count = adapter
            .rename_edge_type(&"likes".into(), &"loves".into())
            .unwrap();
        assert_eq!(count, 1);

        let edges = adapter.get_edges("A").unwrap();
        let renamed = &edges[&stored.id];
        assert_eq!(renamed.edge_type, EdgeTypeId::from("loves"));
        assert_eq!(renamed.to, NodeId::from("b1"));
        assert_eq!(renamed.title.as_deref(), Some("fond of"));
        assert!(!adapter.registry().exists(&"likes".into()).unwrap());
    }

    #[test]
    fn rename_to_same_type_keeps_definition() {
        let adapter = adapter();
        let stored = adapter.insert_edge(&EdgeSpec::new("a1", "b1", "likes")).unwrap().unwrap();

        let count = adapter
            .rename_edge_type(&"likes".into(), &"likes".into())
            .unwrap();
        assert_eq!(count, 0);
        assert!(adapter.registry().exists(&"likes".into()).unwrap());
        let edges = adapter.get_edges("A").unwrap();
        assert_eq!(edges[&stored.id].edge_type, EdgeTypeId::from("likes"));
    }

    #[test]
    fn rename_list_type_moves_references() {
        let adapter = adapter();
        adapter.insert_edge(&EdgeSpec::new("a1", "b1", "list:members")).unwrap();
        adapter
            .rename_edge_type(&"list:members".into(), &"list:crew".into())
            .unwrap();

        let doc = adapter.store().get("A").unwrap().unwrap();
        assert_eq!(doc.field("members"), Some(""));
        assert_eq!(doc.field("crew"), Some("B"));
    }

    #[test]
    fn delete_edge_type_removes_edges_and_definition() {
        let adapter = adapter();
        adapter.insert_edge(&EdgeSpec::new("a1", "b1", "likes")).unwrap();
        adapter.insert_edge(&EdgeSpec::new("b1", "c1", "likes")).unwrap();
        adapter.insert_edge(&EdgeSpec::new("a1", "c1", "knows")).unwrap();

        assert_eq!(adapter.delete_edge_type(&"likes".into()).unwrap(), 2);
        assert!(adapter.select_edges_by_type(&"likes".into()).unwrap().is_empty());
        assert_eq!(adapter.select_edges_by_type(&"knows".into()).unwrap().len(), 1);
        assert!(!adapter.registry().exists(&"likes".into()).unwrap());
    }

    #[test]
    fn insert_node_generates_unique_title() {
        let adapter = adapter();
        let first = adapter.insert_node(None, None, None).unwrap();
        let second = adapter.insert_node(Some(""), None, None).unwrap();
        assert_eq!(first.label, "New node");
        assert_eq!(second.label, "New node 1");
        assert_ne!(first.id, second.id);

        let doc = adapter.store().get("New node").unwrap().unwrap();
        assert_eq!(doc.field("tmap.id"), Some(first.id.as_str()));
        assert!(doc.field("created").is_some());
        assert_eq!(adapter.index().resolve_ref(&first.id).unwrap().as_deref(), Some("New node"));
    }

    #[test]
    fn insert_node_registers_with_view() {
        let adapter = adapter();
        let view = adapter.create_view("Map").unwrap();
        let node = adapter
            .insert_node(Some("Idea"), Some(Position::new(1.0, 2.0)), Some(&view))
            .unwrap();

        assert_eq!(view.node_filter().as_deref(), Some("[[Idea]]"));
        assert_eq!(view.positions()[&node.id], Position::new(1.0, 2.0));
    }

    #[test]
    fn delete_node_removes_connected_edges() {
        let adapter = adapter();
        adapter.insert_edge(&EdgeSpec::new("a1", "b1", "likes")).unwrap();
        adapter.insert_edge(&EdgeSpec::new("b1", "c1", "likes")).unwrap();
        adapter.insert_edge(&EdgeSpec::new("a1", "c1", "likes")).unwrap();

        assert!(adapter.delete_node(&NodeId::from("b1")).unwrap());
        assert!(!adapter.store().exists("B").unwrap());
        assert_eq!(adapter.get_edges("A").unwrap().len(), 1);

        // the index entry outlives the document
        assert_eq!(adapter.index().indexed_ref(&NodeId::from("b1")).as_deref(), Some("B"));
        assert!(!adapter.delete_node(&NodeId::from("b1")).unwrap());
    }

    #[test]
    fn select_nodes_by_ids_skips_unknown() {
        let adapter = adapter();
        let ids = vec![NodeId::from("a1"), NodeId::from("zz")];
        let nodes = adapter.select_nodes_by_ids(&ids, None, None).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(adapter.select_node_by_id(&NodeId::from("c1"), None, None).unwrap().is_some());
        assert!(adapter.select_node_by_id(&NodeId::from("zz"), None, None).unwrap().is_none());
    }
}
