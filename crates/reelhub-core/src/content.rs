use crate::collection::Collection;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Likeable content kinds.
///
/// Each kind maps to exactly one collection, so handlers dispatch on this
/// enum instead of branching on free-form type strings from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Review,
    Comment,
}

impl ContentKind {
    /// The collection where documents of this kind live.
    pub fn collection(&self) -> Collection {
        match self {
            ContentKind::Review => Collection::Reviews,
            ContentKind::Comment => Collection::Comments,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Review => write!(f, "review"),
            ContentKind::Comment => write!(f, "comment"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "review" => Ok(ContentKind::Review),
            "comment" => Ok(ContentKind::Comment),
            _ => Err(CoreError::validation(
                "kind",
                format!("unknown content kind '{s}', expected 'review' or 'comment'"),
            )),
        }
    }
}
