use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use reelhub_core::Collection;
use reelhub_storage::{
    DocumentStore, Filter, Query, QueryResult, StorageError, StoredDocument,
};
use serde_json::Value;
use std::sync::Arc;
use time::OffsetDateTime;

use crate::query;

pub type StorageKey = String; // Format: "collection/id"

pub(crate) fn make_storage_key(collection: Collection, id: &str) -> StorageKey {
    format!("{collection}/{id}")
}

/// Unique secondary keys per collection. Each group is a compound key:
/// all fields of a group equal across two documents is a violation.
fn unique_key_groups(collection: Collection) -> &'static [&'static [&'static str]] {
    match collection {
        Collection::Users => &[&["username"], &["email"]],
        Collection::Movies => &[&["tmdbId"]],
        Collection::Genres => &[&["tmdbId"]],
        Collection::Reviews => &[&["authorId", "tmdbId"]],
        Collection::Comments => &[],
    }
}

/// In-memory document storage backend using a papaya lock-free HashMap.
///
/// This storage implementation provides:
/// - Lock-free concurrent access via papaya::HashMap
/// - Full CRUD operations
/// - Query execution with filtering, sorting, and pagination
/// - Unique secondary key enforcement (the in-memory stand-in for
///   unique indexes in a real document database)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Arc<PapayaHashMap<StorageKey, StoredDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
        }
    }

    fn collection_entries(&self, collection: Collection) -> Vec<StoredDocument> {
        let prefix = format!("{collection}/");
        let guard = self.data.pin();
        guard
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    /// Check every unique key group for the candidate document against
    /// the collection, skipping the document's own id.
    fn check_unique_keys(
        &self,
        collection: Collection,
        id: &str,
        document: &Value,
    ) -> Result<(), StorageError> {
        let groups = unique_key_groups(collection);
        if groups.is_empty() {
            return Ok(());
        }
        let existing = self.collection_entries(collection);
        for group in groups {
            let candidate: Vec<Option<&Value>> =
                group.iter().map(|f| document.get(*f)).collect();
            // Documents missing a keyed field are not indexed under it.
            if candidate.iter().any(Option::is_none) {
                continue;
            }
            for other in &existing {
                if other.id == id {
                    continue;
                }
                let collides = group
                    .iter()
                    .zip(&candidate)
                    .all(|(f, v)| other.document.get(*f) == *v);
                if collides {
                    let value = candidate
                        .iter()
                        .flatten()
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join("+");
                    return Err(StorageError::unique_violation(
                        collection,
                        group.join("+"),
                        value,
                    ));
                }
            }
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.pin().is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(
        &self,
        collection: Collection,
        document: &Value,
    ) -> Result<StoredDocument, StorageError> {
        if !document.is_object() {
            return Err(StorageError::invalid_document(
                "document must be a JSON object",
            ));
        }

        let mut document = document.clone();
        let id = match document.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let generated = uuid::Uuid::new_v4().to_string();
                document["id"] = Value::String(generated.clone());
                generated
            }
        };

        let key = make_storage_key(collection, &id);
        {
            let guard = self.data.pin();
            if guard.get(&key).is_some() {
                return Err(StorageError::already_exists(collection, id));
            }
        }
        self.check_unique_keys(collection, &id, &document)?;

        let stored = StoredDocument::new(id, collection, document);
        self.data.pin().insert(key, stored.clone());
        Ok(stored)
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let key = make_storage_key(collection, id);
        let guard = self.data.pin();
        Ok(guard.get(&key).cloned())
    }

    async fn find(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<QueryResult, StorageError> {
        let candidates = self.collection_entries(collection);
        Ok(query::execute(candidates, query))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        document: &Value,
    ) -> Result<StoredDocument, StorageError> {
        if !document.is_object() {
            return Err(StorageError::invalid_document(
                "document must be a JSON object",
            ));
        }

        let key = make_storage_key(collection, id);
        let created_at = {
            let guard = self.data.pin();
            guard
                .get(&key)
                .ok_or_else(|| StorageError::not_found(collection, id))?
                .created_at
        };
        self.check_unique_keys(collection, id, document)?;

        let mut document = document.clone();
        document["id"] = Value::String(id.to_string());

        let stored = StoredDocument {
            id: id.to_string(),
            collection,
            document,
            updated_at: OffsetDateTime::now_utc(),
            created_at,
        };
        self.data.pin().insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StorageError> {
        let key = make_storage_key(collection, id);
        let guard = self.data.pin();
        match guard.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(collection, id)),
        }
    }

    async fn count(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<usize, StorageError> {
        let count = self
            .collection_entries(collection)
            .iter()
            .filter(|doc| query::matches_all(&doc.document, filters))
            .count();
        Ok(count)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
