//! List edges: a field holding an ordered set of target titles

use super::{CodecContext, EdgeCodec, EdgeWhitelist};
use crate::graph::{Edge, EdgeMap, EdgeSpec, EdgeType, Namespace};
use crate::storage::list::{parse_string_list, stringify_list};
use crate::storage::{set_field, Document, StorageResult};

/// Edges of one `list:<field>` type
pub struct ListCodec {
    ctx: CodecContext,
    ty: EdgeType,
}

impl ListCodec {
    pub fn new(ctx: CodecContext, ty: EdgeType) -> Self {
        Self { ctx, ty }
    }

    fn field(&self) -> &str {
        self.ty.id.name()
    }

    fn targets(&self, doc: &Document) -> Vec<String> {
        doc.non_empty_field(self.field())
            .map(parse_string_list)
            .unwrap_or_default()
    }
}

impl EdgeCodec for ListCodec {
    fn namespace(&self) -> Namespace {
        Namespace::List
    }

    fn enumerate(&self, doc: &Document, whitelist: &EdgeWhitelist) -> StorageResult<EdgeMap> {
        self.ctx
            .reference_edges(&doc.title, &self.ty, &self.targets(doc), whitelist)
    }

    fn insert(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        let Some(to_title) = self.ctx.target_ref(edge.to.as_ref())? else {
            return Ok(None);
        };

        let mut list = self.targets(doc);
        if !list.contains(&to_title) {
            list.push(to_title.clone());
            set_field(self.ctx.store.as_ref(), &doc.title, self.field(), stringify_list(&list))?;
        }
        self.ctx.registry.ensure(&self.ty)?;

        self.ctx.reference_edge(&doc.title, &to_title, &self.ty)
    }

    fn delete(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        let Some(to_title) = self.ctx.target_ref(edge.to.as_ref())? else {
            return Ok(None);
        };

        let mut list = self.targets(doc);
        let Some(pos) = list.iter().position(|t| *t == to_title) else {
            return Ok(None);
        };
        list.remove(pos);
        set_field(self.ctx.store.as_ref(), &doc.title, self.field(), stringify_list(&list))?;

        self.ctx.reference_edge(&doc.title, &to_title, &self.ty)
    }
}
