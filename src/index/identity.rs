//! Identity Index: bidirectional mapping between node ids and document titles
//!
//! Entries form an arena. Once an id is registered for a title it is never
//! removed, not even when the document is deleted; it is only overwritten by
//! a legitimate reassignment. Every reader checks that the document is still
//! live before trusting an index hit, so dangling entries are harmless.

use crate::graph::NodeId;
use crate::storage::{is_live, set_field, DocumentStore, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

#[derive(Debug, Default)]
struct IndexMaps {
    ref_by_id: HashMap<NodeId, String>,
    id_by_ref: HashMap<String, NodeId>,
    /// Set once the persisted id fields of the store have been read
    loaded: bool,
}

impl IndexMaps {
    /// Write both directions in one step
    fn register(&mut self, id: NodeId, title: &str) {
        self.ref_by_id.insert(id.clone(), title.to_string());
        self.id_by_ref.insert(title.to_string(), id);
    }
}

/// The id→title and title→id maps
///
/// Single writer: `assign` and `rebuild` are the only operations that write
/// the maps, and the adapter calls them within one public operation at a
/// time. Both maps are updated under the same write lock.
pub struct IdentityIndex {
    store: Arc<dyn DocumentStore>,
    id_field: String,
    title_identity: bool,
    maps: RwLock<IndexMaps>,
}

impl IdentityIndex {
    /// Create an empty index; `id_field == "title"` selects title-based identity
    pub fn new(store: Arc<dyn DocumentStore>, id_field: impl Into<String>) -> Self {
        let id_field = id_field.into();
        let title_identity = id_field == crate::config::TITLE_FIELD;
        Self {
            store,
            id_field,
            title_identity,
            maps: RwLock::new(IndexMaps::default()),
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn is_title_identity(&self) -> bool {
        self.title_identity
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMaps> {
        self.maps.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMaps> {
        self.maps.write().unwrap_or_else(|p| p.into_inner())
    }

    /// The node id of a live document, if one has been assigned
    ///
    /// Falls back to the id field of the document when the index has no entry
    /// yet and registers it.
    pub fn resolve(&self, title: &str) -> StorageResult<Option<NodeId>> {
        if !is_live(self.store.as_ref(), title)? {
            return Ok(None);
        }
        if self.title_identity {
            return Ok(Some(NodeId::from(title)));
        }
        if let Some(id) = self.read().id_by_ref.get(title) {
            return Ok(Some(id.clone()));
        }
        let stored = self
            .store
            .get(title)?
            .and_then(|doc| doc.non_empty_field(&self.id_field).map(NodeId::from));
        if let Some(id) = &stored {
            self.write().register(id.clone(), title);
        }
        Ok(stored)
    }

    /// The title of the live document carrying this id
    ///
    /// The first miss reads the id fields of all documents, so ids persisted
    /// by an earlier session resolve without a rebuild.
    pub fn resolve_ref(&self, id: &NodeId) -> StorageResult<Option<String>> {
        let title = if self.title_identity {
            Some(id.as_str().to_string())
        } else {
            let hit = self.read().ref_by_id.get(id).cloned();
            match hit {
                Some(title) => Some(title),
                None => {
                    self.load_persisted(false)?;
                    self.read().ref_by_id.get(id).cloned()
                }
            }
        };
        match title {
            Some(title) if is_live(self.store.as_ref(), &title)? => Ok(Some(title)),
            _ => Ok(None),
        }
    }

    /// Titles for a set of ids, skipping unresolvable ones
    pub fn resolve_refs<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a NodeId>,
    ) -> StorageResult<Vec<String>> {
        let mut titles = Vec::new();
        for id in ids {
            if let Some(title) = self.resolve_ref(id)? {
                if !titles.contains(&title) {
                    titles.push(title);
                }
            }
        }
        Ok(titles)
    }

    /// Return the document's id, assigning a fresh one if it has none
    ///
    /// Idempotent: an existing id is returned unchanged unless `force` is
    /// set and identity is not title-based. The index is updated in any
    /// case, since a document may carry an id that is not indexed yet.
    pub fn assign(&self, title: &str, force: bool) -> StorageResult<Option<NodeId>> {
        let Some(doc) = self.store.get(title)? else {
            return Ok(None);
        };

        let id = if self.title_identity {
            NodeId::from(doc.title.as_str())
        } else {
            match doc.non_empty_field(&self.id_field) {
                Some(existing) if !force => NodeId::from(existing),
                _ => {
                    let id = NodeId::new();
                    set_field(self.store.as_ref(), title, &self.id_field, id.as_str())?;
                    info!(title, id = %id, "assigned new node id");
                    id
                }
            }
        };

        self.write().register(id.clone(), title);
        Ok(Some(id))
    }

    /// Register the ids already persisted in the store
    ///
    /// Runs once unless `rescan` is set. Never assigns; titles already
    /// indexed keep their entry. Documents written to the store behind the
    /// index's back are picked up by the next `rebuild`.
    fn load_persisted(&self, rescan: bool) -> StorageResult<()> {
        if self.read().loaded && !rescan {
            return Ok(());
        }
        let mut found = Vec::new();
        for title in self.store.titles()? {
            if let Some(doc) = self.store.get(&title)? {
                if let Some(id) = doc.non_empty_field(&self.id_field) {
                    found.push((NodeId::from(id), title));
                }
            }
        }

        let mut maps = self.write();
        for (id, title) in found {
            if !maps.id_by_ref.contains_key(&title) {
                maps.register(id, &title);
            }
        }
        maps.loaded = true;
        Ok(())
    }

    /// Assign and register ids for every given title
    pub fn rebuild<'a>(&self, titles: impl IntoIterator<Item = &'a String>) -> StorageResult<usize> {
        self.load_persisted(true)?;
        let mut count = 0;
        for title in titles {
            if self.assign(title, false)?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Number of registered ids
    pub fn len(&self) -> usize {
        self.read().ref_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw index lookup without liveness check
    pub fn indexed_ref(&self, id: &NodeId) -> Option<String> {
        self.read().ref_by_id.get(id).cloned()
    }
}
