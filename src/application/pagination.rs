//! Page result shaping.

use serde::Serialize;
use time::OffsetDateTime;

use crate::cache::{EntryState, PageKey, PageSnapshot};

/// One page of content as handed to consumers, with navigation facts
/// derived from the backend's total count.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
    /// Freshness of the served entry at read time.
    pub state: EntryState,
    pub fetched_at: OffsetDateTime,
}

impl<T: Clone> PageResult<T> {
    pub(crate) fn from_snapshot(key: PageKey, snapshot: &PageSnapshot<T>) -> Self {
        Self {
            items: snapshot.entry.items.clone(),
            total_count: snapshot.entry.total_count,
            has_next: key.has_next(snapshot.entry.total_count),
            has_prev: key.has_prev(),
            state: snapshot.state,
            fetched_at: snapshot.entry.fetched_at,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
