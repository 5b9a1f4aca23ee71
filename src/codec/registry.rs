//! Edge type definitions persisted as system documents

use crate::graph::{EdgeType, EdgeTypeId, Namespace};
use crate::storage::{Document, DocumentStore, StorageResult};
use serde_json::{Map, Value};
use std::sync::Arc;

const DESCRIPTION_FIELD: &str = "description";
const LABEL_FIELD: &str = "label";
const SHOW_LABEL_FIELD: &str = "show-label";
const STYLE_FIELD: &str = "style";

/// Reads and writes edge type definitions under a title prefix
///
/// A type that has never been persisted still resolves to a default
/// definition; it is materialized the first time an edge of it is written.
#[derive(Clone)]
pub struct EdgeTypeRegistry {
    store: Arc<dyn DocumentStore>,
    path: String,
}

impl EdgeTypeRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    /// Title of the document defining a type
    pub fn title_of(&self, id: &EdgeTypeId) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Type id of a definition title
    pub fn id_of_title(&self, title: &str) -> Option<EdgeTypeId> {
        title
            .strip_prefix(self.path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|id| !id.is_empty())
            .map(EdgeTypeId::from)
    }

    pub fn exists(&self, id: &EdgeTypeId) -> StorageResult<bool> {
        self.store.exists(&self.title_of(id))
    }

    /// The persisted definition, or a default one
    pub fn get(&self, id: &EdgeTypeId) -> StorageResult<EdgeType> {
        let Some(doc) = self.store.get(&self.title_of(id))? else {
            return Ok(EdgeType::new(id.clone()));
        };

        let style: Map<String, Value> = doc
            .non_empty_field(STYLE_FIELD)
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Ok(EdgeType {
            id: id.clone(),
            description: doc.non_empty_field(DESCRIPTION_FIELD).map(str::to_string),
            label: doc.non_empty_field(LABEL_FIELD).map(str::to_string),
            show_label: doc.non_empty_field(SHOW_LABEL_FIELD).map_or(true, |v| v != "false"),
            style,
        })
    }

    /// Write a definition, replacing any previous one
    pub fn persist(&self, ty: &EdgeType) -> StorageResult<()> {
        let mut doc = Document::new(self.title_of(&ty.id))
            .with_field(SHOW_LABEL_FIELD, if ty.show_label { "true" } else { "false" });
        if let Some(description) = &ty.description {
            doc.set_field(DESCRIPTION_FIELD, description.clone());
        }
        if let Some(label) = &ty.label {
            doc.set_field(LABEL_FIELD, label.clone());
        }
        if !ty.style.is_empty() {
            doc.set_field(STYLE_FIELD, serde_json::to_string(&ty.style)?);
        }
        self.store.put(doc)
    }

    /// Persist the definition if it has not been seen yet
    pub fn ensure(&self, ty: &EdgeType) -> StorageResult<bool> {
        if self.exists(&ty.id)? {
            return Ok(false);
        }
        self.persist(ty)?;
        Ok(true)
    }

    pub fn remove(&self, id: &EdgeTypeId) -> StorageResult<bool> {
        self.store.delete(&self.title_of(id))
    }

    /// Ids of all persisted types
    pub fn ids(&self) -> StorageResult<Vec<EdgeTypeId>> {
        Ok(self
            .store
            .titles()?
            .iter()
            .filter_map(|title| self.id_of_title(title))
            .collect())
    }

    /// Persisted type ids of one namespace
    pub fn ids_in(&self, namespace: Namespace) -> StorageResult<Vec<EdgeTypeId>> {
        Ok(self
            .ids()?
            .into_iter()
            .filter(|id| id.namespace() == namespace)
            .collect())
    }

    /// All persisted type definitions
    pub fn all(&self) -> StorageResult<Vec<EdgeType>> {
        self.ids()?.iter().map(|id| self.get(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn registry() -> EdgeTypeRegistry {
        EdgeTypeRegistry::new(Arc::new(MemoryStore::new()), "$:/types")
    }

    #[test]
    fn unseen_type_resolves_to_default() {
        let registry = registry();
        let ty = registry.get(&EdgeTypeId::from("likes")).unwrap();
        assert_eq!(ty, EdgeType::new("likes"));
        assert!(!registry.exists(&ty.id).unwrap());
    }

    #[test]
    fn persist_and_reload() {
        let registry = registry();
        let ty = EdgeType::new("likes")
            .with_description("A likes B")
            .with_show_label(false)
            .with_style("dashes", json!(true));
        registry.persist(&ty).unwrap();

        assert_eq!(registry.get(&ty.id).unwrap(), ty);
        assert_eq!(registry.ids().unwrap(), vec![EdgeTypeId::from("likes")]);
    }

    #[test]
    fn ensure_only_writes_once() {
        let registry = registry();
        let ty = EdgeType::new("list:tags");
        assert!(registry.ensure(&ty).unwrap());
        assert!(!registry.ensure(&ty.clone().with_label("changed")).unwrap());
        assert_eq!(registry.get(&ty.id).unwrap().label, None);
    }

    #[test]
    fn ids_by_namespace() {
        let registry = registry();
        registry.persist(&EdgeType::new("likes")).unwrap();
        registry.persist(&EdgeType::new("list:members")).unwrap();
        registry.persist(&EdgeType::new("field:parent")).unwrap();

        assert_eq!(registry.ids_in(Namespace::List).unwrap(), vec![EdgeTypeId::from("list:members")]);
        assert_eq!(registry.ids_in(Namespace::SingleValue).unwrap(), vec![EdgeTypeId::from("field:parent")]);
    }

    #[test]
    fn title_mapping() {
        let registry = registry();
        let id = EdgeTypeId::from("list:tags");
        assert_eq!(registry.title_of(&id), "$:/types/list:tags");
        assert_eq!(registry.id_of_title("$:/types/list:tags"), Some(id));
        assert_eq!(registry.id_of_title("$:/typesx/a"), None);
        assert!(registry.remove(&EdgeTypeId::from("likes")).is_ok());
    }
}
