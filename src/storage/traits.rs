//! Storage trait definitions

use super::links::extract_links;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Prefix of system document titles
pub const SYSTEM_PREFIX: &str = "$:/";

/// Field marking a document as the draft of another
pub const DRAFT_FIELD: &str = "draft.of";

/// Field holding a document's primary content
pub const TEXT_FIELD: &str = "text";

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A uniquely titled record with arbitrary string fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Read a field; `title` always yields the document title
    pub fn field(&self, name: &str) -> Option<&str> {
        if name == "title" {
            return Some(&self.title);
        }
        self.fields.get(name).map(String::as_str)
    }

    /// Read a field, treating an empty value as absent
    pub fn non_empty_field(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|v| !v.is_empty())
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn is_system(&self) -> bool {
        self.title.starts_with(SYSTEM_PREFIX)
    }

    pub fn is_draft(&self) -> bool {
        self.fields.contains_key(DRAFT_FIELD)
    }
}

/// Capability over the underlying document store
///
/// Implementations must be thread-safe (Send + Sync). The graph layer
/// assumes exclusive access for the duration of one public call.
pub trait DocumentStore: Send + Sync {
    /// Check whether a document exists
    fn exists(&self, title: &str) -> StorageResult<bool>;

    /// Load a document by title
    fn get(&self, title: &str) -> StorageResult<Option<Document>>;

    /// Create or replace a document
    fn put(&self, document: Document) -> StorageResult<()>;

    /// Delete a document, returning whether it existed
    fn delete(&self, title: &str) -> StorageResult<bool>;

    /// All document titles, sorted
    fn titles(&self) -> StorageResult<Vec<String>>;

    /// Titles referenced from the document's primary content
    fn links_from(&self, title: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .get(title)?
            .and_then(|doc| doc.field(TEXT_FIELD).map(extract_links))
            .unwrap_or_default())
    }

    /// System documents and drafts are excluded from all graph operations
    fn is_system_or_draft(&self, title: &str) -> StorageResult<bool> {
        if title.starts_with(SYSTEM_PREFIX) {
            return Ok(true);
        }
        Ok(self.get(title)?.is_some_and(|doc| doc.is_draft()))
    }

    /// A title that is not yet taken: `base`, `base 1`, `base 2`, ...
    fn generate_unique_title(&self, base: &str) -> StorageResult<String> {
        if !self.exists(base)? {
            return Ok(base.to_string());
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{} {}", base, n);
            if !self.exists(&candidate)? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: DocumentStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Whether a document exists and is neither a system document nor a draft
pub fn is_live(store: &dyn DocumentStore, title: &str) -> StorageResult<bool> {
    Ok(store.exists(title)? && !store.is_system_or_draft(title)?)
}

/// Format of the `created`/`modified` stamps
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Current UTC time in the store's timestamp format
pub fn timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Update a single field of an existing document and stamp `modified`
///
/// Returns false if the document does not exist.
pub fn set_field(
    store: &dyn DocumentStore,
    title: &str,
    name: &str,
    value: impl Into<String>,
) -> StorageResult<bool> {
    let Some(mut doc) = store.get(title)? else {
        return Ok(false);
    };
    doc.set_field(name, value);
    doc.set_field("modified", timestamp());
    store.put(doc)?;
    Ok(true)
}
