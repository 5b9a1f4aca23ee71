//! Edge Codec Set: one normalizer per physical relationship encoding
//!
//! Every codec turns its encoding into the common `Edge` shape and, where
//! the encoding is mutable, writes edges back into the `from` document.

mod field;
mod link;
mod list;
mod registry;
mod stored;

pub use field::FieldCodec;
pub use link::LinkCodec;
pub use list::ListCodec;
pub use registry::EdgeTypeRegistry;
pub use stored::StoredCodec;

use crate::adapter::make_edge;
use crate::graph::{Edge, EdgeId, EdgeMap, EdgeSpec, EdgeType, EdgeTypeId, Namespace, NodeId};
use crate::index::IdentityIndex;
use crate::storage::{is_live, Document, DocumentStore, StorageResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Membership filters restricting which edges are considered
///
/// `None` means no restriction; an empty set excludes everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeWhitelist {
    /// Allowed target document titles
    pub targets: Option<HashSet<String>>,
    /// Allowed edge types
    pub types: Option<HashSet<EdgeTypeId>>,
}

impl EdgeWhitelist {
    /// No restriction
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EdgeTypeId>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_type_set(mut self, types: Option<HashSet<EdgeTypeId>>) -> Self {
        self.types = types;
        self
    }

    pub fn allows_target(&self, title: &str) -> bool {
        self.targets.as_ref().map_or(true, |set| set.contains(title))
    }

    pub fn allows_type(&self, ty: &EdgeTypeId) -> bool {
        self.types.as_ref().map_or(true, |set| set.contains(ty))
    }
}

/// Collaborators shared by every codec
#[derive(Clone)]
pub struct CodecContext {
    pub store: Arc<dyn DocumentStore>,
    pub index: Arc<IdentityIndex>,
    pub registry: EdgeTypeRegistry,
}

impl CodecContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<IdentityIndex>,
        registry: EdgeTypeRegistry,
    ) -> Self {
        Self {
            store,
            index,
            registry,
        }
    }

    /// Title of the live document behind a node id
    pub(crate) fn target_ref(&self, id: Option<&NodeId>) -> StorageResult<Option<String>> {
        match id {
            Some(id) => self.index.resolve_ref(id),
            None => Ok(None),
        }
    }

    /// Build edges from a list of target titles held by `from_title`
    ///
    /// Ids are content hashes of `(type, from, to)`. Targets that are empty,
    /// missing, system documents, drafts or outside the whitelist are skipped.
    pub(crate) fn reference_edges(
        &self,
        from_title: &str,
        ty: &EdgeType,
        targets: &[String],
        whitelist: &EdgeWhitelist,
    ) -> StorageResult<EdgeMap> {
        let mut edges = EdgeMap::new();
        if targets.is_empty() || !whitelist.allows_type(&ty.id) {
            return Ok(edges);
        }

        let from_id = self.index.assign(from_title, false)?;
        for to_title in targets {
            if to_title.is_empty()
                || !whitelist.allows_target(to_title)
                || !is_live(self.store.as_ref(), to_title)?
            {
                continue;
            }
            let id = EdgeId::derived(&ty.id, from_title, to_title);
            let to_id = self.index.assign(to_title, false)?;
            if let Some(edge) = make_edge(from_id.clone(), to_id, ty, Some(id)) {
                edges.insert(edge.id.clone(), edge);
            }
        }
        Ok(edges)
    }

    /// The edge produced by a reference-encoding mutation
    pub(crate) fn reference_edge(
        &self,
        from_title: &str,
        to_title: &str,
        ty: &EdgeType,
    ) -> StorageResult<Option<Edge>> {
        let from_id = self.index.assign(from_title, false)?;
        let to_id = self.index.assign(to_title, false)?;
        let id = EdgeId::derived(&ty.id, from_title, to_title);
        Ok(make_edge(from_id, to_id, ty, Some(id)))
    }
}

/// A normalizer for one physical encoding
///
/// Reference encodings (list, single-value, implicit link) are bound to one
/// edge type; the stored encoding reads the type of each entry.
pub trait EdgeCodec: Send + Sync {
    fn namespace(&self) -> Namespace;

    /// Outgoing edges the encoding holds in `doc`, filtered by the whitelist
    fn enumerate(&self, doc: &Document, whitelist: &EdgeWhitelist) -> StorageResult<EdgeMap>;

    /// Write an edge into `doc`; `Ok(None)` when the descriptor is unusable
    fn insert(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>>;

    /// Remove an edge from `doc`; `Ok(None)` when nothing could be removed
    fn delete(&self, doc: &Document, edge: &EdgeSpec) -> StorageResult<Option<Edge>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_whitelist_allows_everything() {
        let wl = EdgeWhitelist::any();
        assert!(wl.allows_target("A"));
        assert!(wl.allows_type(&EdgeTypeId::from("likes")));
    }

    #[test]
    fn empty_whitelist_excludes_everything() {
        let wl = EdgeWhitelist::any()
            .with_targets(Vec::<String>::new())
            .with_types(Vec::<EdgeTypeId>::new());
        assert!(!wl.allows_target("A"));
        assert!(!wl.allows_type(&EdgeTypeId::from("likes")));
    }

    #[test]
    fn membership_checks() {
        let wl = EdgeWhitelist::any().with_targets(["A"]).with_types(["likes"]);
        assert!(wl.allows_target("A"));
        assert!(!wl.allows_target("B"));
        assert!(wl.allows_type(&EdgeTypeId::from("likes")));
        assert!(!wl.allows_type(&EdgeTypeId::from("list:tags")));
    }
}
