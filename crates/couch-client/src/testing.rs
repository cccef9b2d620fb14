//! In-memory document store for tests.
//!
//! `MemoryStore` follows CouchDB's revision rules closely enough to exercise
//! conflict handling, and can be switched "down" to simulate a dead node.

use crate::{Document, DocumentStore, RangeQuery, StoreError, ViewRow};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Revisioned in-memory store with fault injection.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, Document>>,
    down: AtomicBool,
    dispatches: AtomicUsize,
    revision_counter: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call with a transport error.
    pub fn down() -> Self {
        let store = Self::default();
        store.set_down(true);
        store
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Number of calls dispatched to this store, failed ones included.
    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }

    pub fn reset_dispatch_count(&self) {
        self.dispatches.store(0, Ordering::SeqCst);
    }

    /// Current stored copy of a document, bypassing fault injection.
    pub async fn get(&self, id: &str) -> Option<Document> {
        self.documents.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn dispatch(&self) -> Result<(), StoreError> {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Transport("node is down".to_string()))
        } else {
            Ok(())
        }
    }

    fn next_revision(&self, previous: Option<&str>) -> String {
        let generation = previous
            .and_then(|rev| rev.split_once('-'))
            .and_then(|(n, _)| n.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let counter = self.revision_counter.fetch_add(1, Ordering::SeqCst);
        format!("{generation}-{counter:016x}")
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, document: &Document) -> Result<String, StoreError> {
        self.dispatch()?;
        let mut documents = self.documents.lock().await;
        if documents.contains_key(&document.id) {
            return Err(StoreError::Conflict(document.id.clone()));
        }
        let revision = self.next_revision(None);
        let stored = Document {
            revision: Some(revision.clone()),
            ..document.clone()
        };
        documents.insert(document.id.clone(), stored);
        Ok(revision)
    }

    async fn read(&self, id: &str) -> Result<Document, StoreError> {
        self.dispatch()?;
        self.documents
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, document: &Document) -> Result<String, StoreError> {
        self.dispatch()?;
        let mut documents = self.documents.lock().await;
        let current = documents.get(&document.id).and_then(|d| d.revision.clone());
        match (&current, &document.revision) {
            (None, None) => {}
            (Some(current), Some(given)) if current == given => {}
            _ => return Err(StoreError::Conflict(document.id.clone())),
        }
        let revision = self.next_revision(current.as_deref());
        let stored = Document {
            revision: Some(revision.clone()),
            ..document.clone()
        };
        documents.insert(document.id.clone(), stored);
        Ok(revision)
    }

    async fn delete(&self, id: &str, revision: &str) -> Result<String, StoreError> {
        self.dispatch()?;
        let mut documents = self.documents.lock().await;
        let current = documents
            .get(id)
            .and_then(|d| d.revision.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if current != revision {
            return Err(StoreError::Conflict(id.to_string()));
        }
        documents.remove(id);
        Ok(self.next_revision(Some(&current)))
    }

    async fn range_query(&self, query: &RangeQuery) -> Result<Vec<ViewRow>, StoreError> {
        self.dispatch()?;
        let documents = self.documents.lock().await;
        Ok(documents
            .range(query.start_key.clone()..)
            .take(query.limit)
            .map(|(id, document)| ViewRow {
                id: id.clone(),
                body: query
                    .include_docs
                    .then(|| document.to_json().to_string()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revision_chain() {
        let store = MemoryStore::new();
        let doc = Document::new("akey").with_field("f", "1");

        let rev1 = store.create(&doc).await.unwrap();
        assert!(rev1.starts_with("1-"));

        let stale = doc.clone();
        let current = doc.with_revision(rev1.clone()).with_field("f", "2");
        let rev2 = store.update(&current).await.unwrap();
        assert!(rev2.starts_with("2-"));

        assert_eq!(
            store.update(&stale).await,
            Err(StoreError::Conflict("akey".to_string()))
        );
        assert_eq!(
            store.delete("akey", &rev1).await,
            Err(StoreError::Conflict("akey".to_string()))
        );
        store.delete("akey", &rev2).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_down_store_counts_dispatches() {
        let store = MemoryStore::down();
        assert!(store.read("akey").await.unwrap_err().is_transient());
        assert_eq!(store.dispatch_count(), 1);

        store.set_down(false);
        assert_eq!(
            store.read("akey").await,
            Err(StoreError::NotFound("akey".to_string()))
        );
        assert_eq!(store.dispatch_count(), 2);
    }

    #[tokio::test]
    async fn test_range_query_is_key_ordered() {
        let store = MemoryStore::new();
        for id in ["user3", "user1", "user2", "admin"] {
            store.create(&Document::new(id)).await.unwrap();
        }

        let rows = store
            .range_query(&RangeQuery::from_key("user1").limit(2).include_docs(true))
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["user1", "user2"]);
        assert!(rows.iter().all(|r| r.body.is_some()));
    }
}
