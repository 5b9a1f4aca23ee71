//! Document store capability and its backends
//!
//! The graph layer only talks to the `DocumentStore` trait. `MemoryStore`
//! serves tests and embedding; `SqliteStore` is the persistent backend.

pub mod links;
pub mod list;
mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    is_live, set_field, timestamp, Document, DocumentStore, OpenStore, StorageError,
    StorageResult, DRAFT_FIELD, SYSTEM_PREFIX, TEXT_FIELD, TIMESTAMP_FORMAT,
};
