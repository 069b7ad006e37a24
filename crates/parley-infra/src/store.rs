//! Session store selection.
//!
//! The database is opened once at startup. If it cannot be opened, the
//! process keeps running on the in-memory store for its whole lifetime;
//! there is no reconnection.

use parley_core::store::memory::MemoryDocumentStore;
use parley_core::store::BoxDocumentStore;
use tracing::{info, warn};

use crate::sqlite::document::SqliteDocumentStore;
use crate::sqlite::pool::DatabasePool;

/// Open the SQLite store at `database_url`, or fall back to memory.
pub async fn connect_store(database_url: &str) -> BoxDocumentStore {
    match DatabasePool::new(database_url).await {
        Ok(pool) => {
            info!(database_url, "Session store connected");
            BoxDocumentStore::new(SqliteDocumentStore::new(pool))
        }
        Err(e) => {
            warn!(
                database_url,
                error = %e,
                "Database unreachable, sessions will be kept in memory and lost on exit"
            );
            BoxDocumentStore::new(MemoryDocumentStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::store::DocumentStore;
    use parley_types::document::Filter;
    use serde_json::json;

    #[tokio::test]
    async fn test_connect_store_uses_sqlite_when_reachable() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("parley.db").display());

        let store = connect_store(&url).await;
        assert_eq!(store.backend(), "sqlite");
    }

    #[tokio::test]
    async fn test_connect_store_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let url = format!("sqlite://{}/parley.db?mode=rwc", blocker.display());

        let store = connect_store(&url).await;
        assert_eq!(store.backend(), "memory");

        // The fallback is fully usable.
        let doc = json!({"session_id": "a"}).as_object().cloned().unwrap();
        store.insert_one(doc).await.unwrap();
        assert!(store.find_one(&Filter::by_key("a")).await.unwrap().is_some());
    }
}
