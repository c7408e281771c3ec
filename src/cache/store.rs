//! Content cache storage.
//!
//! Owns both cache tables: pages keyed by [`PageKey`] and by-id
//! resolutions keyed by [`ItemId`]. Reads never block on the backend
//! while any entry exists; refreshes go through per-key single-flight
//! fills that replace entries by atomic `Arc` swap.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::application::source::{ContentSource, SourceError, SourcePage};
use crate::cache::config::{GalleryConfig, RefreshMode};
use crate::cache::entry::{EntryState, ItemEntry, PageEntry};
use crate::cache::events::{EventBus, GalleryEventKind};
use crate::cache::keys::PageKey;
use crate::cache::lock::{rw_read, rw_write};
use crate::cache::revalidate::{FlightBoard, Revalidator, await_flight};
use crate::domain::types::{ContentItem, ItemId};

const SOURCE: &str = "cache::store";

const METRIC_PAGE_HIT: &str = "galleria_page_hit_total";
const METRIC_PAGE_STALE: &str = "galleria_page_stale_total";
const METRIC_PAGE_MISS: &str = "galleria_page_miss_total";
const METRIC_ITEM_HIT: &str = "galleria_item_hit_total";
const METRIC_ITEM_STALE: &str = "galleria_item_stale_total";
const METRIC_ITEM_MISS: &str = "galleria_item_miss_total";
const METRIC_INVALIDATE: &str = "galleria_invalidate_total";

/// A page read: the entry plus its freshness at read time.
#[derive(Debug, Clone)]
pub struct PageSnapshot<T> {
    pub entry: Arc<PageEntry<T>>,
    pub state: EntryState,
}

/// A by-id read: the entry plus its freshness at read time.
#[derive(Debug, Clone)]
pub struct ItemSnapshot<T> {
    pub entry: Arc<ItemEntry<T>>,
    pub state: EntryState,
}

// ============================================================================
// ContentStore
// ============================================================================

/// In-memory store for paginated content with TTL revalidation.
///
/// Cheap to clone; clones share the tables, the flight boards, and the
/// generation counter, so single-flight holds across every handle.
#[derive(Clone)]
pub struct ContentStore<T: ContentItem> {
    source: Arc<dyn ContentSource<Item = T>>,
    pages: Arc<RwLock<LruCache<PageKey, Arc<PageEntry<T>>>>>,
    items: Arc<RwLock<LruCache<ItemId, Arc<ItemEntry<T>>>>>,
    page_flights: FlightBoard<PageKey, Arc<PageEntry<T>>>,
    item_flights: FlightBoard<ItemId, Arc<ItemEntry<T>>>,
    revalidator: Arc<Revalidator>,
    events: EventBus,
    generation: Arc<AtomicU64>,
    refresh_mode: RefreshMode,
}

impl<T: ContentItem> ContentStore<T> {
    pub fn new(
        source: Arc<dyn ContentSource<Item = T>>,
        config: &GalleryConfig,
        events: EventBus,
    ) -> Self {
        Self {
            source,
            pages: Arc::new(RwLock::new(LruCache::new(config.page_cache_limit_non_zero()))),
            items: Arc::new(RwLock::new(LruCache::new(config.item_cache_limit_non_zero()))),
            page_flights: FlightBoard::new("pages"),
            item_flights: FlightBoard::new("items"),
            revalidator: Arc::new(Revalidator::new(config.ttl())),
            events,
            generation: Arc::new(AtomicU64::new(0)),
            refresh_mode: config.refresh_mode,
        }
    }

    // ========================================================================
    // Page reads
    // ========================================================================

    /// Serve the best available entry for `key`.
    ///
    /// Staleness is never an error: a cached entry is always served,
    /// with a refresh triggered per policy once it ages past the TTL.
    /// Only a missing entry whose fetch fails surfaces the failure.
    pub async fn get_page(&self, key: PageKey) -> Result<PageSnapshot<T>, SourceError> {
        let now = OffsetDateTime::now_utc();
        let Some(entry) = self.lookup_page(&key) else {
            counter!(METRIC_PAGE_MISS).increment(1);
            debug!(page = %key, "Page cache miss");
            let rx = self.page_flights.join_or_lead(key, self.fill_page(key));
            return match await_flight(rx).await {
                Ok(entry) => Ok(PageSnapshot {
                    entry,
                    state: EntryState::Fresh,
                }),
                // A concurrent fill may have landed between our miss and
                // the failure; anything cached beats an error.
                Err(err) => match self.lookup_page(&key) {
                    Some(entry) => Ok(self.snapshot_page(entry)),
                    None => Err(err),
                },
            };
        };

        match self.revalidator.classify(entry.fetched_at, now) {
            EntryState::Fresh => {
                counter!(METRIC_PAGE_HIT).increment(1);
                Ok(PageSnapshot {
                    entry,
                    state: EntryState::Fresh,
                })
            }
            _ => {
                counter!(METRIC_PAGE_STALE).increment(1);
                self.refresh_page(key, entry).await
            }
        }
    }

    async fn refresh_page(
        &self,
        key: PageKey,
        prior: Arc<PageEntry<T>>,
    ) -> Result<PageSnapshot<T>, SourceError> {
        match self.refresh_mode {
            RefreshMode::Background => {
                let started = self.page_flights.lead_detached(key, self.fill_page(key));
                debug!(
                    page = %key,
                    refresh_started = started,
                    "Serving stale page while revalidating"
                );
                Ok(PageSnapshot {
                    entry: prior,
                    state: EntryState::Fetching,
                })
            }
            RefreshMode::Blocking => {
                let rx = self.page_flights.join_or_lead(key, self.fill_page(key));
                match await_flight(rx).await {
                    Ok(entry) => Ok(PageSnapshot {
                        entry,
                        state: EntryState::Fresh,
                    }),
                    Err(err) => {
                        warn!(page = %key, error = %err, "Refresh failed; serving stale entry");
                        let entry = self.lookup_page(&key).unwrap_or(prior);
                        Ok(PageSnapshot {
                            entry,
                            state: EntryState::Stale,
                        })
                    }
                }
            }
        }
    }

    /// Build the detached fill future for `key`.
    ///
    /// The future captures only shared handles, so it is owned by the
    /// flight task and runs to completion even when every waiting caller
    /// has been cancelled.
    fn fill_page(
        &self,
        key: PageKey,
    ) -> impl Future<Output = Result<Arc<PageEntry<T>>, SourceError>> + Send + 'static + use<T> {
        let source = Arc::clone(&self.source);
        let pages = Arc::clone(&self.pages);
        let events = self.events.clone();
        let generation = Arc::clone(&self.generation);
        async move {
            let fetched = source
                .fetch_page(key.page_number(), key.page_size())
                .await
                .and_then(|page| check_page(&key, page));
            match fetched {
                Ok(page) => {
                    let entry = Arc::new(PageEntry::new(
                        page.items,
                        page.total_count,
                        OffsetDateTime::now_utc(),
                    ));
                    rw_write(&pages, SOURCE, "store_page").put(key, Arc::clone(&entry));
                    generation.fetch_add(1, Ordering::SeqCst);
                    events.publish(GalleryEventKind::PageUpdated { key });
                    info!(
                        page = %key,
                        items = entry.items.len(),
                        total_count = entry.total_count,
                        "Stored refreshed page"
                    );
                    Ok(entry)
                }
                Err(err) => {
                    let prior_retained = {
                        let mut pages = rw_write(&pages, SOURCE, "record_page_error");
                        let annotated = pages.peek(&key).map(|existing| {
                            let mut entry = existing.as_ref().clone();
                            entry.last_error = Some(err.clone());
                            Arc::new(entry)
                        });
                        match annotated {
                            Some(entry) => {
                                pages.put(key, entry);
                                true
                            }
                            None => false,
                        }
                    };
                    events.publish(GalleryEventKind::PageRefreshFailed { key });
                    warn!(page = %key, error = %err, prior_retained, "Page fetch failed");
                    Err(err)
                }
            }
        }
    }

    // ========================================================================
    // By-id reads
    // ========================================================================

    /// Serve the best available by-id entry, fetching on a miss.
    ///
    /// A cached `item: None` is a real answer (the backend reported the
    /// item gone) and is served without a new fetch until it goes stale.
    pub async fn get_item(&self, id: &ItemId) -> Result<ItemSnapshot<T>, SourceError> {
        let now = OffsetDateTime::now_utc();
        let Some(entry) = self.lookup_item(id) else {
            counter!(METRIC_ITEM_MISS).increment(1);
            debug!(item = %id, "Item cache miss");
            let rx = self
                .item_flights
                .join_or_lead(id.clone(), self.fill_item(id.clone()));
            return match await_flight(rx).await {
                Ok(entry) => Ok(ItemSnapshot {
                    entry,
                    state: EntryState::Fresh,
                }),
                Err(err) => match self.lookup_item(id) {
                    Some(entry) => Ok(self.snapshot_item(entry)),
                    None => Err(err),
                },
            };
        };

        match self.revalidator.classify(entry.fetched_at, now) {
            EntryState::Fresh => {
                counter!(METRIC_ITEM_HIT).increment(1);
                Ok(ItemSnapshot {
                    entry,
                    state: EntryState::Fresh,
                })
            }
            _ => {
                counter!(METRIC_ITEM_STALE).increment(1);
                self.refresh_item(id, entry).await
            }
        }
    }

    async fn refresh_item(
        &self,
        id: &ItemId,
        prior: Arc<ItemEntry<T>>,
    ) -> Result<ItemSnapshot<T>, SourceError> {
        match self.refresh_mode {
            RefreshMode::Background => {
                let started = self
                    .item_flights
                    .lead_detached(id.clone(), self.fill_item(id.clone()));
                debug!(
                    item = %id,
                    refresh_started = started,
                    "Serving stale item while revalidating"
                );
                Ok(ItemSnapshot {
                    entry: prior,
                    state: EntryState::Fetching,
                })
            }
            RefreshMode::Blocking => {
                let rx = self
                    .item_flights
                    .join_or_lead(id.clone(), self.fill_item(id.clone()));
                match await_flight(rx).await {
                    Ok(entry) => Ok(ItemSnapshot {
                        entry,
                        state: EntryState::Fresh,
                    }),
                    Err(err) => {
                        warn!(item = %id, error = %err, "Refresh failed; serving stale entry");
                        let entry = self.lookup_item(id).unwrap_or(prior);
                        Ok(ItemSnapshot {
                            entry,
                            state: EntryState::Stale,
                        })
                    }
                }
            }
        }
    }

    fn fill_item(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<Arc<ItemEntry<T>>, SourceError>> + Send + 'static + use<T> {
        let source = Arc::clone(&self.source);
        let items = Arc::clone(&self.items);
        let events = self.events.clone();
        let generation = Arc::clone(&self.generation);
        async move {
            match source.fetch_by_id(&id).await {
                Ok(item) => {
                    let entry = Arc::new(ItemEntry::new(item, OffsetDateTime::now_utc()));
                    rw_write(&items, SOURCE, "store_item").put(id.clone(), Arc::clone(&entry));
                    generation.fetch_add(1, Ordering::SeqCst);
                    let found = entry.item.is_some();
                    events.publish(GalleryEventKind::ItemUpdated { id: id.clone() });
                    debug!(item = %id, found, "Stored by-id resolution");
                    Ok(entry)
                }
                Err(err) => {
                    {
                        let mut items = rw_write(&items, SOURCE, "record_item_error");
                        let annotated = items.peek(&id).map(|existing| {
                            let mut entry = existing.as_ref().clone();
                            entry.last_error = Some(err.clone());
                            Arc::new(entry)
                        });
                        if let Some(entry) = annotated {
                            items.put(id.clone(), entry);
                        }
                    }
                    events.publish(GalleryEventKind::ItemRefreshFailed { id: id.clone() });
                    warn!(item = %id, error = %err, "Item fetch failed");
                    Err(err)
                }
            }
        }
    }

    // ========================================================================
    // Scans and invalidation
    // ========================================================================

    /// Freshest cached copy of `id` across every cached page and the
    /// by-id table. Copies are compared by revision marker when both
    /// carry one, else by when their entry was fetched.
    pub(crate) fn freshest_cached(&self, id: &ItemId) -> Option<(T, OffsetDateTime)> {
        let mut best: Option<(T, OffsetDateTime)> = None;
        {
            let pages = rw_read(&self.pages, SOURCE, "scan_pages");
            for (_, entry) in pages.iter() {
                for item in &entry.items {
                    if item.id() == id {
                        consider(&mut best, item.clone(), entry.fetched_at);
                    }
                }
            }
        }
        {
            let items = rw_read(&self.items, SOURCE, "scan_items");
            if let Some(entry) = items.peek(id) {
                if let Some(item) = entry.item.as_ref() {
                    consider(&mut best, item.clone(), entry.fetched_at);
                }
            }
        }
        best
    }

    /// Drop one page entry, forcing a refetch on next access.
    pub fn invalidate(&self, key: &PageKey) {
        let dropped = rw_write(&self.pages, SOURCE, "invalidate")
            .pop(key)
            .is_some();
        if dropped {
            self.generation.fetch_add(1, Ordering::SeqCst);
            counter!(METRIC_INVALIDATE).increment(1);
            self.events
                .publish(GalleryEventKind::PageInvalidated { key: *key });
            info!(page = %key, "Invalidated cached page");
        }
    }

    /// Drop every cached page and by-id entry.
    ///
    /// The write path calls this when the backend reports a mutation.
    /// The selection id is deliberately left in place; it re-resolves
    /// against refetched data.
    pub fn invalidate_all(&self) {
        rw_write(&self.pages, SOURCE, "invalidate_all").clear();
        rw_write(&self.items, SOURCE, "invalidate_all").clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        counter!(METRIC_INVALIDATE).increment(1);
        self.events.publish(GalleryEventKind::Invalidated);
        info!("Invalidated all cached gallery data");
    }

    /// Monotonic count of table mutations; keys derived computations.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn cached_pages(&self) -> usize {
        rw_read(&self.pages, SOURCE, "cached_pages").len()
    }

    pub fn cached_items(&self) -> usize {
        rw_read(&self.items, SOURCE, "cached_items").len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn lookup_page(&self, key: &PageKey) -> Option<Arc<PageEntry<T>>> {
        rw_write(&self.pages, SOURCE, "lookup_page").get(key).cloned()
    }

    fn lookup_item(&self, id: &ItemId) -> Option<Arc<ItemEntry<T>>> {
        rw_write(&self.items, SOURCE, "lookup_item").get(id).cloned()
    }

    fn snapshot_page(&self, entry: Arc<PageEntry<T>>) -> PageSnapshot<T> {
        let state = self
            .revalidator
            .classify(entry.fetched_at, OffsetDateTime::now_utc());
        PageSnapshot { entry, state }
    }

    fn snapshot_item(&self, entry: Arc<ItemEntry<T>>) -> ItemSnapshot<T> {
        let state = self
            .revalidator
            .classify(entry.fetched_at, OffsetDateTime::now_utc());
        ItemSnapshot { entry, state }
    }
}

/// Reject backend responses that cannot belong to `key`.
fn check_page<T>(key: &PageKey, page: SourcePage<T>) -> Result<SourcePage<T>, SourceError> {
    if page.items.len() as u64 > u64::from(key.page_size()) {
        return Err(SourceError::malformed(format!(
            "{} items for a page of {}",
            page.items.len(),
            key.page_size()
        )));
    }
    if page.total_count < page.items.len() as u64 {
        return Err(SourceError::malformed(format!(
            "total_count {} below item count {}",
            page.total_count,
            page.items.len()
        )));
    }
    Ok(page)
}

fn consider<T: ContentItem>(
    best: &mut Option<(T, OffsetDateTime)>,
    item: T,
    fetched_at: OffsetDateTime,
) {
    let fresher = match best {
        None => true,
        Some((incumbent, incumbent_at)) => match (item.revision(), incumbent.revision()) {
            (Some(candidate_rev), Some(incumbent_rev)) if candidate_rev != incumbent_rev => {
                candidate_rev > incumbent_rev
            }
            _ => fetched_at > *incumbent_at,
        },
    };
    if fresher {
        *best = Some((item, fetched_at));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::ImageRecord;

    fn sample_image(n: u32) -> ImageRecord {
        ImageRecord {
            id: ItemId::from(format!("item-{n}")),
            slug: format!("image-{n}"),
            title: format!("Image {n}"),
            description: String::new(),
            url: format!("https://cdn.example.com/images/{n}.jpg"),
            placeholder_data_url: None,
            width: 800,
            height: 600,
            file_size: 1_024,
            uploaded_by: "stub".to_string(),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC) + time::Duration::hours(i64::from(n)),
            is_published: true,
        }
    }

    struct StubSource {
        total: u32,
        page_calls: AtomicUsize,
        item_calls: AtomicUsize,
        fail: AtomicBool,
        oversize: AtomicBool,
    }

    impl StubSource {
        fn new(total: u32) -> Self {
            Self {
                total,
                page_calls: AtomicUsize::new(0),
                item_calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                oversize: AtomicBool::new(false),
            }
        }

        fn page_calls(&self) -> usize {
            self.page_calls.load(Ordering::SeqCst)
        }

        fn item_calls(&self) -> usize {
            self.item_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentSource for StubSource {
        type Item = ImageRecord;

        async fn fetch_page(
            &self,
            page_number: u32,
            page_size: u32,
        ) -> Result<SourcePage<ImageRecord>, SourceError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SourceError::transport("stub offline"));
            }
            if self.oversize.load(Ordering::SeqCst) {
                let items = (1..=page_size + 1).map(sample_image).collect();
                return Ok(SourcePage {
                    items,
                    total_count: u64::from(self.total),
                });
            }
            let start = (page_number - 1) * page_size;
            let end = (start + page_size).min(self.total);
            let items = (start + 1..=end).map(sample_image).collect();
            Ok(SourcePage {
                items,
                total_count: u64::from(self.total),
            })
        }

        async fn fetch_by_id(&self, id: &ItemId) -> Result<Option<ImageRecord>, SourceError> {
            self.item_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SourceError::transport("stub offline"));
            }
            Ok((1..=self.total).map(sample_image).find(|image| image.id() == id))
        }
    }

    fn store_with(
        source: Arc<StubSource>,
        config: &GalleryConfig,
    ) -> ContentStore<ImageRecord> {
        ContentStore::new(source, config, EventBus::new(config.event_capacity))
    }

    fn key(page_number: u32) -> PageKey {
        PageKey::new(page_number, 12).expect("valid key")
    }

    #[tokio::test]
    async fn second_read_within_ttl_serves_from_cache() {
        let source = Arc::new(StubSource::new(13));
        let store = store_with(Arc::clone(&source), &GalleryConfig::default());

        let snapshot = store.get_page(key(1)).await.expect("first fill");
        assert_eq!(snapshot.entry.items.len(), 12);
        assert_eq!(snapshot.entry.total_count, 13);
        assert_eq!(snapshot.state, EntryState::Fresh);

        let snapshot = store.get_page(key(1)).await.expect("cache hit");
        assert_eq!(snapshot.state, EntryState::Fresh);
        assert_eq!(source.page_calls(), 1);
        assert_eq!(store.cached_pages(), 1);
    }

    #[tokio::test]
    async fn lru_eviction_drops_the_oldest_page() {
        let source = Arc::new(StubSource::new(40));
        let config = GalleryConfig {
            page_cache_limit: 1,
            ..GalleryConfig::default()
        };
        let store = store_with(Arc::clone(&source), &config);

        store.get_page(key(1)).await.expect("page 1");
        store.get_page(key(2)).await.expect("page 2 evicts page 1");
        assert_eq!(store.cached_pages(), 1);

        store.get_page(key(1)).await.expect("page 1 refetched");
        assert_eq!(source.page_calls(), 3);
    }

    #[tokio::test]
    async fn blocking_refresh_failure_serves_annotated_stale_entry() {
        let source = Arc::new(StubSource::new(13));
        let config = GalleryConfig {
            ttl_ms: 30,
            refresh_mode: RefreshMode::Blocking,
            ..GalleryConfig::default()
        };
        let store = store_with(Arc::clone(&source), &config);

        store.get_page(key(1)).await.expect("initial fill");
        source.fail.store(true, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(40)).await;

        let snapshot = store.get_page(key(1)).await.expect("stale fallback");
        assert_eq!(snapshot.state, EntryState::Stale);
        assert_eq!(snapshot.entry.items.len(), 12);
        assert_eq!(
            snapshot.entry.last_error,
            Some(SourceError::transport("stub offline"))
        );
        assert_eq!(source.page_calls(), 2);

        // The failure did not reset the clock: the next access retries.
        source.fail.store(false, Ordering::SeqCst);
        let snapshot = store.get_page(key(1)).await.expect("retry succeeds");
        assert_eq!(snapshot.state, EntryState::Fresh);
        assert!(snapshot.entry.last_error.is_none());
        assert_eq!(source.page_calls(), 3);
    }

    #[tokio::test]
    async fn miss_with_failing_backend_propagates() {
        let source = Arc::new(StubSource::new(13));
        source.fail.store(true, Ordering::SeqCst);
        let store = store_with(Arc::clone(&source), &GalleryConfig::default());

        let err = store.get_page(key(1)).await.expect_err("nothing to serve");
        assert_eq!(err, SourceError::transport("stub offline"));
    }

    #[tokio::test]
    async fn oversized_backend_page_is_malformed() {
        let source = Arc::new(StubSource::new(40));
        let config = GalleryConfig {
            ttl_ms: 30,
            refresh_mode: RefreshMode::Blocking,
            ..GalleryConfig::default()
        };
        let store = store_with(Arc::clone(&source), &config);

        store.get_page(key(1)).await.expect("initial fill");
        source.oversize.store(true, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(40)).await;

        // The malformed refresh is treated as a failure: prior data
        // keeps serving, annotated with the reason.
        let snapshot = store.get_page(key(1)).await.expect("stale fallback");
        assert_eq!(snapshot.state, EntryState::Stale);
        assert!(matches!(
            snapshot.entry.last_error,
            Some(SourceError::Malformed(_))
        ));

        // With no prior entry, malformed responses surface.
        let err = store.get_page(key(3)).await.expect_err("no prior data");
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn background_refresh_replaces_the_entry_behind_the_reader() {
        let source = Arc::new(StubSource::new(13));
        let config = GalleryConfig {
            ttl_ms: 30,
            ..GalleryConfig::default()
        };
        let store = store_with(Arc::clone(&source), &config);

        let first = store.get_page(key(1)).await.expect("initial fill");
        tokio::time::sleep(StdDuration::from_millis(40)).await;

        let stale = store.get_page(key(1)).await.expect("stale serve");
        assert_eq!(stale.state, EntryState::Fetching);
        assert_eq!(stale.entry.fetched_at, first.entry.fetched_at);

        // The detached refresh lands without any further reads.
        for _ in 0..200 {
            if source.page_calls() == 2 && !store.page_flights.is_inflight(&key(1)) {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(1)).await;
        }
        let refreshed = store.get_page(key(1)).await.expect("fresh after refresh");
        assert_eq!(refreshed.state, EntryState::Fresh);
        assert!(refreshed.entry.fetched_at > first.entry.fetched_at);
        assert_eq!(source.page_calls(), 2);
    }

    #[tokio::test]
    async fn negative_by_id_results_are_cached() {
        let source = Arc::new(StubSource::new(13));
        let store = store_with(Arc::clone(&source), &GalleryConfig::default());

        let id = ItemId::from("item-99");
        let snapshot = store.get_item(&id).await.expect("negative fetch");
        assert!(snapshot.entry.item.is_none());
        assert_eq!(snapshot.state, EntryState::Fresh);

        let snapshot = store.get_item(&id).await.expect("cached negative");
        assert!(snapshot.entry.item.is_none());
        assert_eq!(source.item_calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_all_clears_both_tables() {
        let source = Arc::new(StubSource::new(13));
        let store = store_with(Arc::clone(&source), &GalleryConfig::default());

        store.get_page(key(1)).await.expect("page fill");
        store
            .get_item(&ItemId::from("item-3"))
            .await
            .expect("item fill");
        let generation = store.generation();

        store.invalidate_all();
        assert_eq!(store.cached_pages(), 0);
        assert_eq!(store.cached_items(), 0);
        assert!(store.generation() > generation);

        store.get_page(key(1)).await.expect("refetch after drop");
        assert_eq!(source.page_calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_drops_only_the_given_page() {
        let source = Arc::new(StubSource::new(40));
        let store = store_with(Arc::clone(&source), &GalleryConfig::default());

        store.get_page(key(1)).await.expect("page 1");
        store.get_page(key(2)).await.expect("page 2");

        store.invalidate(&key(1));
        assert_eq!(store.cached_pages(), 1);

        store.get_page(key(2)).await.expect("page 2 still cached");
        assert_eq!(source.page_calls(), 2);
        store.get_page(key(1)).await.expect("page 1 refetched");
        assert_eq!(source.page_calls(), 3);
    }

    #[tokio::test]
    async fn freshest_cached_prefers_the_newer_revision() {
        let source = Arc::new(StubSource::new(13));
        let store = store_with(Arc::clone(&source), &GalleryConfig::default());

        let mut old_copy = sample_image(5);
        old_copy.updated_at = datetime!(2024-03-01 0:00 UTC);
        let mut new_copy = sample_image(5);
        new_copy.updated_at = datetime!(2024-04-01 0:00 UTC);

        // The newer revision sits in an *older* entry; revision wins.
        {
            let mut pages = rw_write(&store.pages, SOURCE, "test_seed");
            pages.put(
                key(1),
                Arc::new(PageEntry::new(
                    vec![old_copy],
                    13,
                    datetime!(2024-05-02 0:00 UTC),
                )),
            );
            pages.put(
                key(2),
                Arc::new(PageEntry::new(
                    vec![new_copy],
                    13,
                    datetime!(2024-05-01 0:00 UTC),
                )),
            );
        }

        let (found, _) = store
            .freshest_cached(&ItemId::from("item-5"))
            .expect("copy found");
        assert_eq!(found.updated_at, datetime!(2024-04-01 0:00 UTC));

        // A cached negative by-id entry contributes nothing.
        assert!(store.freshest_cached(&ItemId::from("item-404")).is_none());
    }
}
