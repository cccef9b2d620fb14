//! Trait definitions for document stores.

use crate::{Document, RangeQuery, StoreError, ViewRow};

/// Capabilities a single storage node must provide to the connector.
///
/// Deliberately narrow: attachments, bulk operations, replication,
/// compaction and change feeds are not part of the contract.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a new document. Fails with `Conflict` if the id already exists.
    ///
    /// Returns the revision assigned by the store.
    async fn create(&self, document: &Document) -> Result<String, StoreError>;

    /// Fetch the current revision of a document.
    async fn read(&self, id: &str) -> Result<Document, StoreError>;

    /// Replace a document. The document's revision must match the store's.
    ///
    /// Returns the new revision.
    async fn update(&self, document: &Document) -> Result<String, StoreError>;

    /// Delete a document at the given revision.
    ///
    /// Returns the revision of the deletion tombstone.
    async fn delete(&self, id: &str, revision: &str) -> Result<String, StoreError>;

    /// Key-ordered range query starting at (and including) `query.start_key`.
    async fn range_query(&self, query: &RangeQuery) -> Result<Vec<ViewRow>, StoreError>;
}
