//! In-memory document store

use super::traits::{Document, DocumentStore, StorageResult};
use dashmap::DashMap;

/// DashMap-backed document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<String, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Create a store seeded with the given documents
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        for doc in documents {
            store.documents.insert(doc.title.clone(), doc);
        }
        store
    }

    /// Create a store from a JSON array of `{title, fields}` objects
    pub fn from_json(json: &str) -> StorageResult<Self> {
        let documents: Vec<Document> = serde_json::from_str(json)?;
        Ok(Self::with_documents(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn exists(&self, title: &str) -> StorageResult<bool> {
        Ok(self.documents.contains_key(title))
    }

    fn get(&self, title: &str) -> StorageResult<Option<Document>> {
        Ok(self.documents.get(title).map(|r| r.clone()))
    }

    fn put(&self, document: Document) -> StorageResult<()> {
        self.documents.insert(document.title.clone(), document);
        Ok(())
    }

    fn delete(&self, title: &str) -> StorageResult<bool> {
        Ok(self.documents.remove(title).is_some())
    }

    fn titles(&self) -> StorageResult<Vec<String>> {
        let mut titles: Vec<String> = self.documents.iter().map(|r| r.key().clone()).collect();
        titles.sort();
        Ok(titles)
    }
}
