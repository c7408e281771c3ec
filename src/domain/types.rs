//! Shared domain types for cached content.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable identifier of a content item, unique within a collection.
///
/// The cache treats identifiers as opaque strings; backends may put
/// UUIDs, slugs, or any other stable token inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Minimal contract a cached item must satisfy.
///
/// The cache never interprets item payloads beyond the identifier and,
/// when the backend supplies one, a revision marker used to pick the
/// freshest of several cached copies of the same item.
pub trait ContentItem: Clone + Send + Sync + 'static {
    /// Stable identifier of this item.
    fn id(&self) -> &ItemId;

    /// Optional version marker (e.g. an updated-at timestamp).
    ///
    /// Only consulted when comparing two cached copies of the same
    /// item; `None` falls back to cache-entry age.
    fn revision(&self) -> Option<OffsetDateTime> {
        None
    }
}
