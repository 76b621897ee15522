//! # reelhub-storage
//!
//! Document storage abstraction for the ReelHub server.
//!
//! This crate defines the trait and types that all storage backends must
//! implement. It does not contain any implementations - those are provided
//! by separate crates (see `reelhub-db-memory`).
//!
//! ## Overview
//!
//! The main trait is [`DocumentStore`], which defines the contract for:
//! - CRUD operations (insert, get, update, delete)
//! - Queries with filters, sorting, and pagination
//! - Counting
//!
//! ## Example
//!
//! ```ignore
//! use reelhub_core::Collection;
//! use reelhub_storage::{DocumentStore, Filter, Query, Sort, StorageError, StoredDocument};
//!
//! async fn reviews_for_movie(
//!     store: &dyn DocumentStore,
//!     tmdb_id: i64,
//! ) -> Result<Vec<StoredDocument>, StorageError> {
//!     let query = Query::new()
//!         .filter(Filter::eq("tmdbId", tmdb_id))
//!         .sort(Sort::desc("createdAt"));
//!
//!     let result = store.find(Collection::Reviews, &query).await?;
//!     Ok(result.entries)
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::StorageError;
pub use traits::DocumentStore;
pub use types::{Filter, Query, QueryResult, Sort, SortOrder, StoredDocument};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStore = std::sync::Arc<dyn DocumentStore>;
