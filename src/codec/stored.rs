//! Stored edges: an id-keyed JSON map kept in one field of the `from` document

use super::{CodecContext, EdgeCodec, EdgeWhitelist};
use crate::adapter::make_edge;
use crate::graph::{Edge, EdgeId, EdgeMap, EdgeSpec, EdgeTypeId, Namespace, NodeId};
use crate::storage::{set_field, Document, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One entry of the stored edge map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredConnection {
    to: NodeId,
    #[serde(rename = "type")]
    edge_type: EdgeTypeId,
}

type Connections = BTreeMap<EdgeId, StoredConnection>;

pub struct StoredCodec {
    ctx: CodecContext,
    field: String,
}

impl StoredCodec {
    pub fn new(ctx: CodecContext, field: impl Into<String>) -> Self {
        Self {
            ctx,
            field: field.into(),
        }
    }

    fn connections(&self, doc: &Document) -> Connections {
        let Some(json) = doc.non_empty_field(&self.field) else {
            return Connections::new();
        };
        match serde_json::from_str(json) {
            Ok(map) => map,
            Err(e) => {
                debug!(title = %doc.title, error = %e, "ignoring malformed stored edges");
                Connections::new()
            }
        }
    }

    fn write(&self, doc: &Document, connections: &Connections) -> StorageResult<()> {
        let json = serde_json::to_string(connections)?;
        set_field(self.ctx.store.as_ref(), &doc.title, &self.field, json)?;
        Ok(())
    }
}

impl EdgeCodec for StoredCodec {
    fn namespace(&self) -> Namespace {
        Namespace::Stored
    }

    fn enumerate(&self, doc: &Document, whitelist: &EdgeWhitelist) -> StorageResult<EdgeMap> {
        let mut edges = EdgeMap::new();
        let connections = self.connections(doc);
        if connections.is_empty() {
            return Ok(edges);
        }

        let from_id = self.ctx.index.assign(&doc.title, false)?;
        for (id, conn) in connections {
            if !whitelist.allows_type(&conn.edge_type) {
                continue;
            }
            // stale targets are dropped
            let Some(to_title) = self.ctx.index.resolve_ref(&conn.to)? else {
                continue;
            };
            if !whitelist.allows_target(&to_title) {
                continue;
            }
            let ty = self.ctx.registry.get(&conn.edge_type)?;
            if let Some(edge) = make_edge(from_id.clone(), Some(conn.to), &ty, Some(id)) {
                edges.insert(edge.id.clone(), edge);
            }
        }
        Ok(edges)
    }

    fn insert(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        let (Some(type_id), Some(to)) = (&edge.edge_type, &edge.to) else {
            return Ok(None);
        };
        let ty = self.ctx.registry.get(type_id)?;
        let id = edge.id.clone().unwrap_or_default();

        let mut connections = self.connections(doc);
        connections.insert(
            id.clone(),
            StoredConnection {
                to: to.clone(),
                edge_type: type_id.clone(),
            },
        );
        self.write(doc, &connections)?;
        self.ctx.registry.ensure(&ty)?;

        let from = self.ctx.index.assign(&doc.title, false)?;
        Ok(make_edge(from, Some(to.clone()), &ty, Some(id)))
    }

    fn delete(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>> {
        let Some(id) = &edge.id else {
            return Ok(None);
        };
        let mut connections = self.connections(doc);
        let Some(removed) = connections.remove(id) else {
            return Ok(None);
        };
        self.write(doc, &connections)?;

        let ty = self.ctx.registry.get(&removed.edge_type)?;
        let from = self.ctx.index.assign(&doc.title, false)?;
        Ok(make_edge(from, Some(removed.to), &ty, Some(id.clone())))
    }
}
