use super::{Document, DocumentStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    // Pass through non-sqlite schemes
    if !url.starts_with("sqlite:") {
        return url.to_string();
    }

    // In-memory URLs like sqlite::memory: or sqlite::memory:?cache=shared
    if url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    // Expand leading ~/ to HOME
    let expanded_path = if let Some(rest) = path_part.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            format!("{}/{}", home.trim_end_matches('/'), rest)
        } else {
            path_part.to_string()
        }
    } else {
        path_part.to_string()
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// SQLite-backed key-document store. Documents are stored as JSON bodies in a
/// single `documents` table keyed by (collection, id).
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    #[instrument(skip_all)]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match body {
            Some(body) => {
                let doc: Document = serde_json::from_str(&body)
                    .with_context(|| format!("malformed document body at {collection}/{id}"))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip_all)]
    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES (?, ?, ?) \
             ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write document {collection}/{id}"))?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn add(&self, collection: &str, doc: &Document) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(doc)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(body)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to add document to {collection}"))?;
        Ok(id)
    }

    #[instrument(skip_all)]
    async fn scan(&self, collection: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.get("body");
            let doc: Document = serde_json::from_str(&body)
                .with_context(|| format!("malformed document body in {collection}"))?;
            docs.push(doc);
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_store() -> SqliteStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = setup_store().await;
        let d = doc(json!({"name": "Test School", "isVerified": true}));
        store.set("schools", "s-1", &d).await.unwrap();

        let fetched = store.get("schools", "s-1").await.unwrap().unwrap();
        assert_eq!(fetched, d);
        assert!(store.get("schools", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_replaces_entire_body() {
        let store = setup_store().await;
        store
            .set("schools", "s-1", &doc(json!({"a": 1, "b": 2})))
            .await
            .unwrap();
        store
            .set("schools", "s-1", &doc(json!({"a": 3})))
            .await
            .unwrap();

        let fetched = store.get("schools", "s-1").await.unwrap().unwrap();
        assert_eq!(fetched, doc(json!({"a": 3})));
    }

    #[tokio::test]
    async fn add_generates_distinct_ids() {
        let store = setup_store().await;
        let a = store.add("organizers", &doc(json!({"n": 1}))).await.unwrap();
        let b = store.add("organizers", &doc(json!({"n": 2}))).await.unwrap();
        assert_ne!(a, b);

        let docs = store.scan("organizers").await.unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn scan_is_scoped_to_collection() {
        let store = setup_store().await;
        store.add("schools", &doc(json!({"n": 1}))).await.unwrap();
        store
            .add("homeSegments", &doc(json!({"segmentKey": "featured"})))
            .await
            .unwrap();

        let segs = store.scan("homeSegments").await.unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0]["segmentKey"], "featured");
    }

    #[test]
    fn prepare_url_passthrough_for_memory() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(prepare_sqlite_url("postgres://x"), "postgres://x");
    }
}
