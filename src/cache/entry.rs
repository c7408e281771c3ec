//! Cached values and their freshness states.

use std::fmt;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::application::source::SourceError;

/// Freshness of a cached entry at the moment it was read.
///
/// `Fresh` entries are younger than the TTL and served directly. `Stale`
/// entries have aged past the TTL (or lost their backing refresh) but
/// remain servable. `Fetching` marks a key whose refresh is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Fresh,
    Stale,
    Fetching,
}

impl EntryState {
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }

    pub fn is_stale(self) -> bool {
        matches!(self, Self::Stale)
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Fetching => "fetching",
        };
        f.write_str(label)
    }
}

/// One cached page of the collection.
///
/// Entries are immutable once stored; any update (including recording a
/// refresh failure) swaps the whole entry atomically so readers observe
/// either the old version or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct PageEntry<T> {
    /// Items in server-provided order.
    pub items: Vec<T>,
    /// Collection size at fetch time.
    pub total_count: u64,
    /// Wall-clock time of the last successful fetch.
    pub fetched_at: OffsetDateTime,
    /// Most recent refresh failure for this key, if any.
    pub last_error: Option<SourceError>,
}

impl<T> PageEntry<T> {
    pub fn new(items: Vec<T>, total_count: u64, fetched_at: OffsetDateTime) -> Self {
        Self {
            items,
            total_count,
            fetched_at,
            last_error: None,
        }
    }

    /// Wall-clock age relative to `now`.
    pub fn age(&self, now: OffsetDateTime) -> Duration {
        now - self.fetched_at
    }
}

/// One cached by-id resolution.
///
/// `item: None` is a cached negative result: the backend answered and
/// the item does not exist. Caching the absence keeps repeated selection
/// resolution from hammering the backend for deleted items.
#[derive(Debug, Clone)]
pub struct ItemEntry<T> {
    pub item: Option<T>,
    pub fetched_at: OffsetDateTime,
    pub last_error: Option<SourceError>,
}

impl<T> ItemEntry<T> {
    pub fn new(item: Option<T>, fetched_at: OffsetDateTime) -> Self {
        Self {
            item,
            fetched_at,
            last_error: None,
        }
    }
}
