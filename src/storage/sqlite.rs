//! SQLite storage backend for documents

use super::traits::{Document, DocumentStore, OpenStore, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed document store
///
/// One table keyed by title; the field map is stored as JSON.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                title TEXT PRIMARY KEY,
                fields_json TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored documents
    pub fn document_count(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert or replace many documents in one transaction
    pub fn put_all(&self, documents: impl IntoIterator<Item = Document>) -> StorageResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut count = 0;
        for doc in documents {
            let fields_json = serde_json::to_string(&doc.fields)?;
            tx.execute(
                "INSERT OR REPLACE INTO documents (title, fields_json) VALUES (?1, ?2)",
                params![doc.title, fields_json],
            )?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl DocumentStore for SqliteStore {
    fn exists(&self, title: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM documents WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get(&self, title: &str) -> StorageResult<Option<Document>> {
        let fields_json: Option<String> = self
            .conn()
            .query_row(
                "SELECT fields_json FROM documents WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?;

        match fields_json {
            Some(json) => {
                let fields: BTreeMap<String, String> = serde_json::from_str(&json)?;
                Ok(Some(Document {
                    title: title.to_string(),
                    fields,
                }))
            }
            None => Ok(None),
        }
    }

    fn put(&self, document: Document) -> StorageResult<()> {
        let fields_json = serde_json::to_string(&document.fields)?;
        self.conn().execute(
            r#"
            INSERT INTO documents (title, fields_json)
            VALUES (?1, ?2)
            ON CONFLICT(title) DO UPDATE SET fields_json = excluded.fields_json
            "#,
            params![document.title, fields_json],
        )?;
        Ok(())
    }

    fn delete(&self, title: &str) -> StorageResult<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM documents WHERE title = ?1", params![title])?;
        Ok(affected > 0)
    }

    fn titles(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT title FROM documents ORDER BY title")?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_put_and_get_document() {
        let store = create_test_store();
        store
            .put(Document::new("A").with_field("tmap.id", "a1").with_field("text", "[[B]]"))
            .unwrap();

        let doc = store.get("A").unwrap().unwrap();
        assert_eq!(doc.field("tmap.id"), Some("a1"));
        assert_eq!(store.links_from("A").unwrap(), vec!["B"]);
    }

    #[test]
    fn test_put_replaces_fields() {
        let store = create_test_store();
        store.put(Document::new("A").with_field("color", "red")).unwrap();
        store.put(Document::new("A").with_field("caption", "Alpha")).unwrap();

        let doc = store.get("A").unwrap().unwrap();
        assert_eq!(doc.field("color"), None);
        assert_eq!(doc.field("caption"), Some("Alpha"));
        assert_eq!(store.document_count().unwrap(), 1);
    }

    #[test]
    fn test_delete_document() {
        let store = create_test_store();
        store.put(Document::new("A")).unwrap();
        assert!(store.delete("A").unwrap());
        assert!(!store.exists("A").unwrap());
        assert!(!store.delete("A").unwrap());
    }

    #[test]
    fn test_titles_sorted() {
        let store = create_test_store();
        let count = store
            .put_all([Document::new("c"), Document::new("a"), Document::new("b")])
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.titles().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_document() {
        let store = create_test_store();
        assert!(store.get("nope").unwrap().is_none());
        assert!(!store.exists("nope").unwrap());
    }
}
