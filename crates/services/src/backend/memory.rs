//! In-memory document backend for development and tests.
//!
//! Keeps the same revision semantics as the hosted store: every committed
//! write bumps an integer revision, and a guarded put with a stale revision
//! fails with [`StoreError::Conflict`]. Tests of the reconciliation workflow
//! rely on this to exercise the compare-and-swap retry loop without a
//! network.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{Document, DocumentBackend, Revision};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct StoredDoc {
    rev: u64,
    body: Value,
}

impl StoredDoc {
    fn to_document(&self, id: &str) -> Document {
        Document {
            id: id.to_owned(),
            rev: Revision::new(self.rev.to_string()),
            body: self.body.clone(),
        }
    }
}

type Collections = HashMap<String, HashMap<String, StoredDoc>>;

/// An in-process document store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: RwLock<Collections>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>, StoreError> {
        self.collections
            .read()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>, StoreError> {
        self.collections
            .write()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|doc| doc.to_document(id)))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| doc.to_document(id))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_owned()).or_default();
        let id = Uuid::new_v4().to_string();
        let stored = StoredDoc { rev: 1, body };
        let document = stored.to_document(&id);
        docs.insert(id, stored);
        Ok(document)
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected: Option<&Revision>,
    ) -> Result<Document, StoreError> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_owned()).or_default();

        match docs.get_mut(id) {
            Some(existing) => {
                if let Some(expected) = expected
                    && expected.as_str() != existing.rev.to_string()
                {
                    return Err(StoreError::Conflict(format!("{collection}/{id}")));
                }
                existing.rev += 1;
                existing.body = body;
                Ok(existing.to_document(id))
            }
            None => {
                if expected.is_some() {
                    // A guarded write against an absent document can never
                    // match its expected revision.
                    return Err(StoreError::Conflict(format!("{collection}/{id}")));
                }
                let stored = StoredDoc { rev: 1, body };
                let document = stored.to_document(id);
                docs.insert(id.to_owned(), stored);
                Ok(document)
            }
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.write()?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_initial_revision() {
        let backend = MemoryBackend::new();
        let doc = backend
            .insert("products", json!({"name": "rice"}))
            .await
            .expect("insert");

        assert!(!doc.id.is_empty());
        assert_eq!(doc.rev.as_str(), "1");

        let fetched = backend
            .get("products", &doc.id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(fetched.body, json!({"name": "rice"}));
    }

    #[tokio::test]
    async fn test_guarded_put_with_current_revision_succeeds() {
        let backend = MemoryBackend::new();
        let doc = backend
            .insert("products", json!({"stock": 5}))
            .await
            .expect("insert");

        let updated = backend
            .put("products", &doc.id, json!({"stock": 4}), Some(&doc.rev))
            .await
            .expect("guarded put");
        assert_eq!(updated.rev.as_str(), "2");
    }

    #[tokio::test]
    async fn test_guarded_put_with_stale_revision_conflicts() {
        let backend = MemoryBackend::new();
        let doc = backend
            .insert("products", json!({"stock": 5}))
            .await
            .expect("insert");

        // Someone else wins the race
        backend
            .put("products", &doc.id, json!({"stock": 4}), Some(&doc.rev))
            .await
            .expect("first writer");

        let result = backend
            .put("products", &doc.id, json!({"stock": 3}), Some(&doc.rev))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        // The losing write changed nothing
        let fetched = backend
            .get("products", &doc.id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(fetched.body, json!({"stock": 4}));
    }

    #[tokio::test]
    async fn test_unguarded_put_creates_when_absent() {
        let backend = MemoryBackend::new();
        let doc = backend
            .put("users", "uid-1", json!({"email": "a@b.c"}), None)
            .await
            .expect("put");
        assert_eq!(doc.id, "uid-1");
        assert_eq!(doc.rev.as_str(), "1");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new();
        let doc = backend.insert("products", json!({})).await.expect("insert");

        backend.delete("products", &doc.id).await.expect("delete");
        backend.delete("products", &doc.id).await.expect("repeat delete");
        assert!(backend.get("products", &doc.id).await.expect("get").is_none());
    }
}
