//! Storage traits for the document storage abstraction layer.

use async_trait::async_trait;
use reelhub_core::Collection;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{Filter, Query, QueryResult, StoredDocument};

/// The document storage contract all backends implement.
///
/// Implementations must be thread-safe (`Send + Sync`). Query execution,
/// filtering, and unique-key enforcement live behind this boundary; the
/// service layer only issues reads and writes.
///
/// # Example
///
/// ```ignore
/// use reelhub_storage::{DocumentStore, StorageError, StoredDocument};
///
/// async fn get_review(store: &dyn DocumentStore, id: &str) -> Result<StoredDocument, StorageError> {
///     store
///         .get(Collection::Reviews, id)
///         .await?
///         .ok_or_else(|| StorageError::not_found(Collection::Reviews, id))
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document.
    ///
    /// If the document carries an `id` field it is used; otherwise the
    /// backend generates one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the id is taken, and
    /// `StorageError::UniqueViolation` if a unique secondary key
    /// (e.g. `users.username`, `movies.tmdbId`) is violated.
    async fn insert(
        &self,
        collection: Collection,
        document: &Value,
    ) -> Result<StoredDocument, StorageError>;

    /// Reads a document by id. Returns `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// documents.
    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// Finds documents matching a query, with total count and pagination.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidDocument` for malformed filters.
    async fn find(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<QueryResult, StorageError>;

    /// Replaces an existing document's content in full.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist,
    /// and `StorageError::UniqueViolation` if the update would break a
    /// unique key.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        document: &Value,
    ) -> Result<StoredDocument, StorageError>;

    /// Deletes a document by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StorageError>;

    /// Counts documents matching the given filters.
    async fn count(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<usize, StorageError>;

    /// Returns the name of this storage backend for logging.
    fn backend_name(&self) -> &'static str;
}
