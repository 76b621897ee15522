//! # reelhub-db-memory
//!
//! In-memory [`DocumentStore`](reelhub_storage::DocumentStore) backend.
//!
//! Documents live in a lock-free papaya map keyed `collection/id`; queries
//! filter, sort, and paginate over the JSON content. Unique secondary keys
//! (usernames, TMDB ids, one review per author per movie) are enforced
//! here, mirroring the unique indexes a real document database would hold.
//!
//! Data does not survive a process restart. This backend is the default
//! for development and tests; production deployments swap in a real
//! database behind the same trait.

mod query;
mod storage;

pub use storage::InMemoryStore;
