//! # reelhub-cache
//!
//! In-process TTL cache with three independent namespaces: TMDB API
//! responses, resolved movie records, and review-list pages. Identical
//! keys in different namespaces never collide.
//!
//! The store is an explicitly constructed instance carried in application
//! state; nothing here is global. All operations are total - expired or
//! missing entries read as absent, never as errors. Eviction is TTL-only
//! with no size bound, which is acceptable because the persistence layer
//! is the source of truth and the cache is a pure acceleration layer that
//! does not survive restarts.
//!
//! A second "stale" tier holds longer-lived copies written alongside
//! successful upstream fetches. It is consulted only when a fresh fetch
//! fails, so briefly outdated data beats an error page.

mod store;

pub use store::{CacheStats, CacheStore, Namespace, NamespaceStats};
