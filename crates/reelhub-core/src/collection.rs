use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of document collections the persistence layer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Users,
    Movies,
    Reviews,
    Comments,
    Genres,
}

impl Collection {
    /// All collections, in a stable order. Used by backends that
    /// pre-allocate one map per collection.
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Movies,
        Collection::Reviews,
        Collection::Comments,
        Collection::Genres,
    ];

    /// Singular kind name used in error messages ("Review not found: ...").
    pub fn kind(&self) -> &'static str {
        match self {
            Collection::Users => "User",
            Collection::Movies => "Movie",
            Collection::Reviews => "Review",
            Collection::Comments => "Comment",
            Collection::Genres => "Genre",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Users => write!(f, "users"),
            Collection::Movies => write!(f, "movies"),
            Collection::Reviews => write!(f, "reviews"),
            Collection::Comments => write!(f, "comments"),
            Collection::Genres => write!(f, "genres"),
        }
    }
}

impl FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Collection::Users),
            "movies" => Ok(Collection::Movies),
            "reviews" => Ok(Collection::Reviews),
            "comments" => Ok(Collection::Comments),
            "genres" => Ok(Collection::Genres),
            _ => Err(CoreError::validation(
                "collection",
                format!("unknown collection: {s}"),
            )),
        }
    }
}
