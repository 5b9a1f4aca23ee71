//! Edge Store: aggregates the codecs behind one edge interface

use crate::codec::{
    CodecContext, EdgeCodec, EdgeWhitelist, FieldCodec, LinkCodec, ListCodec, StoredCodec,
};
use crate::config::AdapterConfig;
use crate::graph::{Edge, EdgeAction, EdgeMap, EdgeSpec, EdgeType, EdgeTypeId, Namespace};
use crate::storage::{is_live, StorageResult};
use std::sync::Arc;
use tracing::debug;

pub struct EdgeStore {
    ctx: CodecContext,
    config: Arc<AdapterConfig>,
}

impl EdgeStore {
    pub fn new(ctx: CodecContext, config: Arc<AdapterConfig>) -> Self {
        Self { ctx, config }
    }

    pub fn context(&self) -> &CodecContext {
        &self.ctx
    }

    /// Configured fields of a namespace plus the registered types of it
    fn field_types(&self, namespace: Namespace, fields: &[String]) -> StorageResult<Vec<EdgeTypeId>> {
        let mut ids: Vec<EdgeTypeId> = fields.iter().map(|f| namespace.type_id(f)).collect();
        for id in self.ctx.registry.ids_in(namespace)? {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Every edge type the store knows of
    ///
    /// Registered definitions, the configured list and single-value fields
    /// and the implicit link type.
    pub fn known_types(&self) -> StorageResult<Vec<EdgeTypeId>> {
        let stores = &self.config.edge_stores;
        let mut ids = self.ctx.registry.ids()?;
        let extra = self
            .field_types(Namespace::List, &stores.list_fields)?
            .into_iter()
            .chain(self.field_types(Namespace::SingleValue, &stores.single_fields)?)
            .chain(std::iter::once(self.config.link_type()));
        for id in extra {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// The codec owning a type
    fn codec_for(&self, ty: EdgeType) -> Box<dyn EdgeCodec> {
        let ctx = self.ctx.clone();
        match ty.namespace() {
            Namespace::Stored => Box::new(StoredCodec::new(ctx, self.config.fields.edges.clone())),
            Namespace::List => Box::new(ListCodec::new(ctx, ty)),
            Namespace::SingleValue => Box::new(FieldCodec::new(ctx, ty)),
            Namespace::ImplicitLink => Box::new(LinkCodec::new(ctx, ty, self.config.fields.text.clone())),
        }
    }

    /// One codec per registered edge store
    fn codecs(&self) -> StorageResult<Vec<Box<dyn EdgeCodec>>> {
        let stores = &self.config.edge_stores;
        let mut codecs: Vec<Box<dyn EdgeCodec>> = vec![Box::new(StoredCodec::new(
            self.ctx.clone(),
            self.config.fields.edges.clone(),
        ))];

        let reference_types = self
            .field_types(Namespace::List, &stores.list_fields)?
            .into_iter()
            .chain(self.field_types(Namespace::SingleValue, &stores.single_fields)?)
            .chain(std::iter::once(self.config.link_type()));
        for id in reference_types {
            let ty = self.ctx.registry.get(&id)?;
            codecs.push(self.codec_for(ty));
        }
        Ok(codecs)
    }

    fn outgoing_with(
        &self,
        codecs: &[Box<dyn EdgeCodec>],
        title: &str,
        whitelist: &EdgeWhitelist,
    ) -> StorageResult<EdgeMap> {
        let mut edges = EdgeMap::new();
        if !is_live(self.ctx.store.as_ref(), title)? {
            return Ok(edges);
        }
        let Some(doc) = self.ctx.store.get(title)? else {
            return Ok(edges);
        };
        for codec in codecs {
            for (id, edge) in codec.enumerate(&doc, whitelist)? {
                edges.entry(id).or_insert(edge);
            }
        }
        Ok(edges)
    }

    /// Normalized outgoing edges of a document
    pub fn outgoing_edges(&self, title: &str, whitelist: &EdgeWhitelist) -> StorageResult<EdgeMap> {
        let codecs = self.codecs()?;
        self.outgoing_with(&codecs, title, whitelist)
    }

    /// Union of the outgoing edges of many documents; earlier ones win
    pub fn edges_for_set<S: AsRef<str>>(
        &self,
        titles: &[S],
        whitelist: &EdgeWhitelist,
    ) -> StorageResult<EdgeMap> {
        let codecs = self.codecs()?;
        let mut edges = EdgeMap::new();
        for title in titles {
            for (id, edge) in self.outgoing_with(&codecs, title.as_ref(), whitelist)? {
                edges.entry(id).or_insert(edge);
            }
        }
        Ok(edges)
    }

    /// Route an insert or delete to the codec of the edge's type
    ///
    /// Returns nothing if the descriptor is incomplete, `from` does not
    /// resolve, or the codec rejects the operation.
    pub fn process_edge(&self, edge: &EdgeSpec, action: EdgeAction) -> StorageResult<Option<Edge>> {
        let (Some(from), Some(type_id)) = (&edge.from, &edge.edge_type) else {
            return Ok(None);
        };
        if !type_id.namespace().is_mutable() {
            return Ok(None);
        }
        if action == EdgeAction::Insert && edge.to.is_none() {
            return Ok(None);
        }
        let Some(from_title) = self.ctx.index.resolve_ref(from)? else {
            return Ok(None);
        };
        let Some(doc) = self.ctx.store.get(&from_title)? else {
            return Ok(None);
        };

        let codec = self.codec_for(self.ctx.registry.get(type_id)?);
        debug!(
            %action,
            edge_type = %type_id,
            namespace = codec.namespace().prefix(),
            from = %from_title,
            "processing edge"
        );
        match action {
            EdgeAction::Insert => codec.insert(&doc, edge),
            EdgeAction::Delete => codec.delete(&doc, edge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EdgeTypeRegistry;
    use crate::graph::NodeId;
    use crate::index::IdentityIndex;
    use crate::storage::{Document, DocumentStore, MemoryStore};

    fn setup(config: AdapterConfig) -> (Arc<MemoryStore>, EdgeStore) {
        let store = Arc::new(MemoryStore::with_documents([
            Document::new("A")
                .with_field("tmap.id", "a1")
                .with_field("tags", "B")
                .with_field("text", "see [[C]]"),
            Document::new("B").with_field("tmap.id", "b1"),
            Document::new("C").with_field("tmap.id", "c1").with_field("parent", "A"),
        ]));
        let index = Arc::new(IdentityIndex::new(store.clone(), "tmap.id"));
        for title in ["A", "B", "C"] {
            index.assign(title, false).unwrap();
        }
        let registry = EdgeTypeRegistry::new(store.clone(), &config.paths.edge_types);
        let ctx = CodecContext::new(store.clone(), index, registry);
        (store, EdgeStore::new(ctx, Arc::new(config)))
    }

    #[test]
    fn merges_all_encodings() {
        let (_store, edges) = setup(AdapterConfig::default());
        edges
            .process_edge(&EdgeSpec::new("a1", "c1", "likes"), EdgeAction::Insert)
            .unwrap()
            .unwrap();

        let out = edges.outgoing_edges("A", &EdgeWhitelist::any()).unwrap();
        let mut types: Vec<&str> = out.values().map(|e| e.edge_type.as_str()).collect();
        types.sort();
        assert_eq!(types, vec!["body:link", "likes", "list:tags"]);
    }

    #[test]
    fn single_fields_are_opt_in() {
        let (_store, edges) = setup(AdapterConfig::default());
        assert!(edges.outgoing_edges("C", &EdgeWhitelist::any()).unwrap().is_empty());

        let (_store, edges) = setup(AdapterConfig::default().with_single_field("parent"));
        let out = edges.outgoing_edges("C", &EdgeWhitelist::any()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.values().all(|e| e.to == NodeId::from("a1")));
    }

    #[test]
    fn whitelists_hold_for_every_edge() {
        let (_store, edges) = setup(AdapterConfig::default());
        edges
            .process_edge(&EdgeSpec::new("a1", "b1", "likes"), EdgeAction::Insert)
            .unwrap();

        let wl = EdgeWhitelist::any().with_targets(["B"]).with_types(["likes", "body:link"]);
        let out = edges.outgoing_edges("A", &wl).unwrap();
        assert_eq!(out.len(), 1);
        for edge in out.values() {
            assert_eq!(edge.to, NodeId::from("b1"));
            assert_eq!(edge.edge_type.as_str(), "likes");
        }

        let none = EdgeWhitelist::any().with_types(Vec::<EdgeTypeId>::new());
        assert!(edges.outgoing_edges("A", &none).unwrap().is_empty());
    }

    #[test]
    fn incomplete_descriptors_are_ignored() {
        let (_store, edges) = setup(AdapterConfig::default());
        let no_to = EdgeSpec {
            to: None,
            ..EdgeSpec::new("a1", "b1", "likes")
        };
        assert!(edges.process_edge(&no_to, EdgeAction::Insert).unwrap().is_none());

        let no_type = EdgeSpec {
            edge_type: None,
            ..EdgeSpec::new("a1", "b1", "likes")
        };
        assert!(edges.process_edge(&no_type, EdgeAction::Insert).unwrap().is_none());

        let bad_from = EdgeSpec::new("zz", "b1", "likes");
        assert!(edges.process_edge(&bad_from, EdgeAction::Insert).unwrap().is_none());
    }

    #[test]
    fn implicit_links_reject_mutation() {
        let (store, edges) = setup(AdapterConfig::default());
        let spec = EdgeSpec::new("a1", "b1", "body:link");
        assert!(edges.process_edge(&spec, EdgeAction::Insert).unwrap().is_none());
        assert!(edges.process_edge(&spec, EdgeAction::Delete).unwrap().is_none());
        assert_eq!(store.get("A").unwrap().unwrap().field("text"), Some("see [[C]]"));
    }

    #[test]
    fn unprefixed_link_type_still_yields_links() {
        let config = AdapterConfig {
            implicit_link_type: EdgeTypeId::from("links"),
            ..AdapterConfig::default()
        };
        let (_store, edges) = setup(config);
        let out = edges.outgoing_edges("A", &EdgeWhitelist::any()).unwrap();
        let links: Vec<&Edge> = out.values().filter(|e| e.edge_type.as_str() == "body:links").collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].to, NodeId::from("c1"));
        assert!(edges.known_types().unwrap().contains(&EdgeTypeId::from("body:links")));
    }

    #[test]
    fn registered_list_types_become_edge_stores() {
        let (store, edges) = setup(AdapterConfig::default());
        edges
            .process_edge(&EdgeSpec::new("b1", "c1", "list:members"), EdgeAction::Insert)
            .unwrap()
            .unwrap();
        assert_eq!(store.get("B").unwrap().unwrap().field("members"), Some("C"));

        let out = edges.outgoing_edges("B", &EdgeWhitelist::any()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(edges.known_types().unwrap().contains(&EdgeTypeId::from("list:members")));
    }

    #[test]
    fn edges_for_set_unions_documents() {
        let (_store, edges) = setup(AdapterConfig::default());
        let all = edges.edges_for_set(&["A", "B", "C"], &EdgeWhitelist::any()).unwrap();
        assert_eq!(all.len(), 2);
        assert!(edges.edges_for_set(&["$:/x"], &EdgeWhitelist::any()).unwrap().is_empty());
    }
}
