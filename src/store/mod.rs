//! Document store abstraction and its SQLite implementation.
//!
//! The import pipeline only needs four operations from its backing store:
//! get-by-id, full-replace set, add-with-generated-id, and a collection scan
//! (used for `homeSegments`). Keeping them behind a trait lets tests drive
//! the pipeline with fakes and lets per-row failures stay isolated — there is
//! deliberately no batch/transaction surface here.

pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

pub use sqlite::SqliteStore;

/// A stored document: a flat JSON object, superset of a validated record.
pub type Document = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id, `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Write a document under an explicit id, replacing any existing body
    /// entirely (no merge).
    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<()>;

    /// Insert a document under a store-generated id and return that id.
    async fn add(&self, collection: &str, doc: &Document) -> Result<String>;

    /// All documents in a collection, in unspecified order.
    async fn scan(&self, collection: &str) -> Result<Vec<Document>>;
}
