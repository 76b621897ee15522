//! Storage error types for the document storage abstraction.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested document was not found.
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// The collection that was queried.
        collection: String,
        /// The id of the document that was not found.
        id: String,
    },

    /// Attempted to insert a document with an id that already exists.
    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists {
        /// The collection that was written to.
        collection: String,
        /// The id of the conflicting document.
        id: String,
    },

    /// A unique secondary key was violated on insert or update.
    #[error("Unique key violation on {collection}.{field}: {value}")]
    UniqueViolation {
        /// The collection that was written to.
        collection: String,
        /// The indexed field.
        field: String,
        /// The conflicting value.
        value: String,
    },

    /// The document data is invalid.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Description of why the document is invalid.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(collection: impl ToString, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(collection: impl ToString, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            collection: collection.to_string(),
            id: id.into(),
        }
    }

    /// Creates a new `UniqueViolation` error.
    #[must_use]
    pub fn unique_violation(
        collection: impl ToString,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UniqueViolation {
            collection: collection.to_string(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error should surface as a conflict to API callers.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists { .. } | Self::UniqueViolation { .. }
        )
    }
}
