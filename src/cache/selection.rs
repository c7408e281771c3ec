//! Selection tracking across cache refreshes.

use std::sync::{Arc, RwLock};

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::cache::events::{EventBus, GalleryEventKind};
use crate::cache::lock::{rw_read, rw_write};
use crate::cache::memo::MemoCell;
use crate::cache::store::ContentStore;
use crate::domain::types::{ContentItem, ItemId};

const SOURCE: &str = "cache::selection";

/// Tracks which item the consumer has selected, independently of the
/// page the item happens to appear on.
///
/// The stored id survives pagination, refreshes, and invalidation; it
/// changes only through [`select`](Self::select) and
/// [`clear_selection`](Self::clear_selection). Resolution prefers
/// cached copies and falls back to a by-id fetch.
#[derive(Clone)]
pub struct SelectionTracker<T: ContentItem> {
    store: ContentStore<T>,
    selected: Arc<RwLock<Option<ItemId>>>,
    events: EventBus,
    memo: MemoCell<(ItemId, u64), Option<(T, OffsetDateTime)>>,
}

impl<T: ContentItem> SelectionTracker<T> {
    pub(crate) fn new(store: ContentStore<T>, events: EventBus) -> Self {
        Self {
            store,
            selected: Arc::new(RwLock::new(None)),
            events,
            memo: MemoCell::default(),
        }
    }

    /// Record `id` as selected. Unconditional: the item need not be
    /// cached, or even exist.
    pub fn select(&self, id: impl Into<ItemId>) {
        let id = id.into();
        *rw_write(&self.selected, SOURCE, "select") = Some(id.clone());
        debug!(item = %id, "Selection changed");
        self.events.publish(GalleryEventKind::SelectionChanged {
            selected: Some(id),
        });
    }

    pub fn clear_selection(&self) {
        *rw_write(&self.selected, SOURCE, "clear_selection") = None;
        self.memo.invalidate();
        debug!("Selection cleared");
        self.events
            .publish(GalleryEventKind::SelectionChanged { selected: None });
    }

    pub fn selected_id(&self) -> Option<ItemId> {
        rw_read(&self.selected, SOURCE, "selected_id").clone()
    }

    /// Resolve the selected id to its freshest available copy.
    ///
    /// Cached pages and the by-id table are scanned first, memoized per
    /// (id, cache generation) so repeated reads between cache changes do
    /// no rescanning. Only when no copy is cached does this fall back to
    /// a by-id fetch. A `None` answer from the backend leaves the stored
    /// id in place; the item may reappear after the next refresh.
    pub async fn resolve(&self) -> Option<T> {
        let id = self.selected_id()?;
        let scanned = self
            .memo
            .get_or_insert_with((id.clone(), self.store.generation()), || {
                self.store.freshest_cached(&id)
            });
        if let Some((item, _)) = scanned {
            return Some(item);
        }
        match self.store.get_item(&id).await {
            Ok(snapshot) => snapshot.entry.item.clone(),
            Err(err) => {
                warn!(item = %id, error = %err, "Selection resolution failed");
                None
            }
        }
    }
}
