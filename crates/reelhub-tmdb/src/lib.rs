//! Rate-limited, cached TMDB API client.
//!
//! Outbound traffic is throttled by a sliding-window governor and every
//! response is cached under a canonical key derived from the endpoint
//! path and its query parameters. A second, longer-lived stale copy of
//! each response serves as a fallback when TMDB is unreachable.

mod client;
mod error;
mod governor;
mod key;

pub use client::{TmdbClient, TmdbConfig};
pub use error::{Result, TmdbError};
pub use key::derive_key;
