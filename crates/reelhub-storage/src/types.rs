//! Data types used by the document storage traits.

use reelhub_core::Collection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A document as stored in a storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The document id.
    pub id: String,
    /// The collection this document belongs to.
    pub collection: Collection,
    /// The full document content as JSON.
    pub document: Value,
    /// When the document was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// When the document was originally created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StoredDocument {
    /// Creates a new `StoredDocument` with both timestamps set to now.
    #[must_use]
    pub fn new(id: impl Into<String>, collection: Collection, document: Value) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            collection,
            document,
            updated_at: now,
            created_at: now,
        }
    }

    /// Deserialize the document content into a typed value.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.document.clone())
    }
}

/// A single filter condition applied to documents in a collection.
///
/// Field names may be dotted paths into nested objects (`"meta.source"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Exact JSON value match.
    Eq { field: String, value: Value },
    /// Case-insensitive substring match on string fields (text search).
    Contains { field: String, value: String },
    /// Inclusive numeric range; open ends allowed.
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Field value is one of the given values.
    In { field: String, values: Vec<Value> },
    /// Boolean field match.
    Bool { field: String, value: bool },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn is_true(field: impl Into<String>) -> Self {
        Self::Bool {
            field: field.into(),
            value: true,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Sort clause: one field plus direction. JSON values sort with numbers
/// before strings; missing fields sort last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }
}

/// A find query: filters ANDed together, optional sort, offset/limit window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub offset: usize,
    /// `None` means no limit.
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn paginate(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }
}

/// Result of a find operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// The matching documents for this page.
    pub entries: Vec<StoredDocument>,
    /// Total count of matching documents before pagination.
    pub total: usize,
    /// Whether there are more results beyond this page.
    pub has_more: bool,
}

impl QueryResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
