//! Single-value edges: a field holding at most one target title

use super::{CodecContext, EdgeCodec, EdgeWhitelist};
use crate::graph::{Edge, EdgeMap, EdgeSpec, EdgeType, Namespace};
use crate::storage::{set_field, Document, StorageResult};

/// Edges of one `field:<field>` type
pub struct FieldCodec {
    ctx: CodecContext,
    ty: EdgeType,
}

impl FieldCodec {
    pub fn new(ctx: CodecContext, ty: EdgeType) -> Self {
        Self { ctx, ty }
    }

    fn field(&self) -> &str {
        self.ty.id.name()
    }

    /// Resolve the target, write the field and materialize the type
    fn write(&self, doc: &Document, edge: &EdgeSpec, clear: bool) -> StorageResult<Option<Edge>> {
        let Some(to_title) = self.ctx.target_ref(edge.to.as_ref())? else {
            return Ok(None);
        };
        let value = if clear { "" } else { to_title.as_str() };
        set_field(self.ctx.store.as_ref(), &doc.title, self.field(), value)?;
        self.ctx.registry.ensure(&self.ty)?;

        self.ctx.reference_edge(&doc.title, &to_title, &self.ty)
    }
}

impl EdgeCodec for FieldCodec {
    fn namespace(&self) -> Namespace {
        Namespace::SingleValue
    }

    fn enumerate(&self, doc: &Document, whitelist: &EdgeWhitelist) -> StorageResult<EdgeMap> {
        let targets: Vec<String> = doc
            .non_empty_field(self.field())
            .map(|title| vec![title.to_string()])
            .unwrap_or_default();
        self.ctx.reference_edges(&doc.title, &self.ty, &targets, whitelist)
    }

    /// Overwrites any previous target
    fn insert(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        self.write(doc, edge, false)
    }

    /// Clears the field
    fn delete(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        self.write(doc, edge, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EdgeTypeRegistry;
    use crate::graph::NodeId;
    use crate::index::IdentityIndex;
    use crate::storage::{DocumentStore, MemoryStore};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryStore>, FieldCodec) {
        let store = Arc::new(MemoryStore::with_documents([
            Document::new("A").with_field("tmap.id", "a1"),
            Document::new("B").with_field("tmap.id", "b1"),
            Document::new("C").with_field("tmap.id", "c1"),
        ]));
        let index = Arc::new(IdentityIndex::new(store.clone(), "tmap.id"));
        for title in ["A", "B", "C"] {
            index.assign(title, false).unwrap();
        }
        let registry = EdgeTypeRegistry::new(store.clone(), "$:/types");
        let ctx = CodecContext::new(store.clone(), index, registry);
        (store, FieldCodec::new(ctx, EdgeType::new("field:parent")))
    }

    fn doc(store: &MemoryStore, title: &str) -> Document {
        store.get(title).unwrap().unwrap()
    }

    #[test]
    fn empty_field_yields_no_edge() {
        let (store, codec) = setup();
        assert!(codec.enumerate(&doc(&store, "A"), &EdgeWhitelist::any()).unwrap().is_empty());
    }

    #[test]
    fn insert_overwrites_previous_target() {
        let (store, codec) = setup();
        codec.insert(&doc(&store, "A"), &EdgeSpec::new("a1", "b1", "field:parent")).unwrap();
        codec.insert(&doc(&store, "A"), &EdgeSpec::new("a1", "c1", "field:parent")).unwrap();

        let edges = codec.enumerate(&doc(&store, "A"), &EdgeWhitelist::any()).unwrap();
        assert_eq!(edges.len(), 1);
        assert!(edges.values().all(|e| e.to == NodeId::from("c1")));
        assert_eq!(doc(&store, "A").field("parent"), Some("C"));
    }

    #[test]
    fn delete_clears_field_and_materializes_type() {
        let (store, codec) = setup();
        let removed = codec
            .delete(&doc(&store, "A"), &EdgeSpec::new("a1", "b1", "field:parent"))
            .unwrap();
        assert!(removed.is_some());
        assert_eq!(doc(&store, "A").field("parent"), Some(""));
        assert!(store.exists("$:/types/field:parent").unwrap());
    }

    #[test]
    fn round_trip() {
        let (store, codec) = setup();
        let spec = EdgeSpec::new("a1", "b1", "field:parent");
        let inserted = codec.insert(&doc(&store, "A"), &spec).unwrap().unwrap();
        let edges = codec.enumerate(&doc(&store, "A"), &EdgeWhitelist::any()).unwrap();
        assert!(edges.contains_key(&inserted.id));

        codec.delete(&doc(&store, "A"), &spec).unwrap();
        assert!(codec.enumerate(&doc(&store, "A"), &EdgeWhitelist::any()).unwrap().is_empty());
    }
}
