//! Backend trait describing the content collection being cached.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::types::{ContentItem, ItemId};

/// One fetched slice of the remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage<T> {
    /// Items in server-provided order.
    pub items: Vec<T>,
    /// Size of the whole collection at fetch time.
    pub total_count: u64,
}

/// Failure reported by the backing content source.
///
/// Derives `Clone` so every caller joined on a single in-flight fetch can
/// receive the identical failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("backend transport failed: {0}")]
    Transport(String),
    #[error("backend timed out")]
    Timeout,
    #[error("backend returned a malformed response: {0}")]
    Malformed(String),
    #[error("fetch task aborted before publishing a result")]
    Aborted,
}

impl SourceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Read access to the remote content collection.
///
/// Implementations wrap whatever actually answers queries (a CMS client,
/// a database, an HTTP API). The cache calls these at most once per key
/// per refresh; it never retries on its own.
#[async_trait]
pub trait ContentSource: Send + Sync {
    type Item: ContentItem;

    /// Fetch one page of the collection.
    ///
    /// `page_number` is 1-based. The returned slice must contain at most
    /// `page_size` items, ordered as the backend orders them, together
    /// with the collection size at fetch time.
    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<SourcePage<Self::Item>, SourceError>;

    /// Fetch a single item by identifier.
    ///
    /// `Ok(None)` means the item does not exist (deleted or never
    /// published); that is a normal result, not an error.
    async fn fetch_by_id(&self, id: &ItemId) -> Result<Option<Self::Item>, SourceError>;
}
