//! Implicit link edges, derived from references in a document's content
//!
//! Read-only: links are edited through the content itself.

use super::{CodecContext, EdgeCodec, EdgeWhitelist};
use crate::graph::{Edge, EdgeMap, EdgeSpec, EdgeType, Namespace};
use crate::storage::links::extract_links;
use crate::storage::{Document, StorageResult, TEXT_FIELD};

pub struct LinkCodec {
    ctx: CodecContext,
    ty: EdgeType,
    text_field: String,
}

impl LinkCodec {
    pub fn new(ctx: CodecContext, ty: EdgeType, text_field: impl Into<String>) -> Self {
        Self {
            ctx,
            ty,
            text_field: text_field.into(),
        }
    }

    fn links(&self, doc: &Document) -> StorageResult<Vec<String>> {
        if self.text_field == TEXT_FIELD {
            return self.ctx.store.links_from(&doc.title);
        }
        Ok(doc.field(&self.text_field).map(extract_links).unwrap_or_default())
    }
}

impl EdgeCodec for LinkCodec {
    fn namespace(&self) -> Namespace {
        Namespace::ImplicitLink
    }

    fn enumerate(&self, doc: &Document, whitelist: &EdgeWhitelist) -> StorageResult<EdgeMap> {
        if !whitelist.allows_type(&self.ty.id) {
            return Ok(EdgeMap::new());
        }
        let links = self.links(doc)?;
        self.ctx.reference_edges(&doc.title, &self.ty, &links, whitelist)
    }

    fn insert(&self, _doc: &Document, _edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        Ok(None)
    }

    fn delete(&self, _doc: &Document, _edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EdgeTypeRegistry;
    use crate::graph::{EdgeId, NodeId};
    use crate::index::IdentityIndex;
    use crate::storage::{DocumentStore, MemoryStore};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryStore>, LinkCodec) {
        let store = Arc::new(MemoryStore::with_documents([
            Document::new("A")
                .with_field("tmap.id", "a1")
                .with_field("text", "See [[B]] and [C](C) and [[$:/hidden]]"),
            Document::new("B").with_field("tmap.id", "b1"),
            Document::new("C").with_field("tmap.id", "c1"),
        ]));
        let index = Arc::new(IdentityIndex::new(store.clone(), "tmap.id"));
        let registry = EdgeTypeRegistry::new(store.clone(), "$:/types");
        let ctx = CodecContext::new(store.clone(), index, registry);
        (store, LinkCodec::new(ctx, EdgeType::new("body:link"), "text"))
    }

    #[test]
    fn links_become_edges() {
        let (store, codec) = setup();
        let a = store.get("A").unwrap().unwrap();
        let edges = codec.enumerate(&a, &EdgeWhitelist::any()).unwrap();

        assert_eq!(edges.len(), 2);
        let id = EdgeId::derived(&"body:link".into(), "A", "B");
        assert_eq!(edges[&id].to, NodeId::from("b1"));
    }

    #[test]
    fn type_whitelist_applies() {
        let (store, codec) = setup();
        let a = store.get("A").unwrap().unwrap();
        let wl = EdgeWhitelist::any().with_types(["likes"]);
        assert!(codec.enumerate(&a, &wl).unwrap().is_empty());
    }

    #[test]
    fn mutations_are_unsupported() {
        let (store, codec) = setup();
        let a = store.get("A").unwrap().unwrap();
        let spec = EdgeSpec::new("a1", "b1", "body:link");
        assert!(codec.insert(&a, &spec).unwrap().is_none());
        assert!(codec.delete(&a, &spec).unwrap().is_none());
        assert_eq!(codec.namespace(), Namespace::ImplicitLink);
    }
}
