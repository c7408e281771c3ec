//! Gallery query facade.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::instrument;

use crate::application::error::GalleryError;
use crate::application::pagination::PageResult;
use crate::application::source::ContentSource;
use crate::cache::{
    ContentStore, EventBus, GalleryConfig, GalleryEvent, PageKey, SelectionTracker,
};
use crate::domain::types::{ContentItem, ItemId};

/// Consumer-facing surface over the cache and selection state.
///
/// Owns the whole context: one store, one selection tracker, one event
/// bus, wired together from a [`GalleryConfig`]. Cheap to clone; clones
/// share everything, so single-flight and selection hold across every
/// handle.
#[derive(Clone)]
pub struct GalleryService<T: ContentItem> {
    store: ContentStore<T>,
    selection: SelectionTracker<T>,
    events: EventBus,
    config: GalleryConfig,
}

impl<T: ContentItem> GalleryService<T> {
    pub fn new(source: Arc<dyn ContentSource<Item = T>>, config: GalleryConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        let store = ContentStore::new(source, &config, events.clone());
        let selection = SelectionTracker::new(store.clone(), events.clone());
        Self {
            store,
            selection,
            events,
            config,
        }
    }

    /// List one page of content.
    ///
    /// `page_number` is 1-based; zero for either argument is invalid
    /// input and is never retried. Staleness is not an error: the best
    /// cached data is served and refreshed per the configured mode.
    #[instrument(skip(self))]
    pub async fn list_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<PageResult<T>, GalleryError> {
        let key = PageKey::new(page_number, page_size)?;
        let snapshot = self.store.get_page(key).await?;
        Ok(PageResult::from_snapshot(key, &snapshot))
    }

    /// List one page using the configured page size.
    pub async fn list(&self, page_number: u32) -> Result<PageResult<T>, GalleryError> {
        self.list_page(page_number, self.config.page_size).await
    }

    /// Record an item as selected. The id need not be cached, or exist.
    pub fn select(&self, id: impl Into<ItemId>) {
        self.selection.select(id);
    }

    pub fn clear_selection(&self) {
        self.selection.clear_selection();
    }

    pub fn selected_id(&self) -> Option<ItemId> {
        self.selection.selected_id()
    }

    /// Freshest available copy of the selected item, if one is selected
    /// and the backend still knows it.
    pub async fn current_selection(&self) -> Option<T> {
        self.selection.resolve().await
    }

    /// Drop one cached page, forcing a refetch on next access.
    pub fn invalidate(&self, key: &PageKey) {
        self.store.invalidate(key);
    }

    /// Drop all cached data. The selection is kept.
    pub fn invalidate_all(&self) {
        self.store.invalidate_all();
    }

    /// Subscribe to cache and selection events.
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.events.subscribe()
    }

    /// The event bus shared by the store and the selection tracker.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn store(&self) -> &ContentStore<T> {
        &self.store
    }
}
