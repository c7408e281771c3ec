//! Gallery event system.
//!
//! Replaces implicit reactive re-computation with an explicit contract:
//! the store and the selection tracker publish events, interested
//! consumers subscribe. Publishing never blocks and tolerates having no
//! subscribers at all.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::cache::keys::PageKey;
use crate::domain::types::ItemId;

const METRIC_EVENT_PUBLISHED: &str = "galleria_event_published_total";

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

/// What happened inside the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEventKind {
    /// A page fetch succeeded and its entry was (re)stored.
    PageUpdated { key: PageKey },
    /// A page refresh failed; any prior entry keeps serving.
    PageRefreshFailed { key: PageKey },
    /// A by-id resolution succeeded and its entry was (re)stored.
    ItemUpdated { id: ItemId },
    /// A by-id refresh failed.
    ItemRefreshFailed { id: ItemId },
    /// The selection changed; `None` means it was cleared.
    SelectionChanged { selected: Option<ItemId> },
    /// One page entry was explicitly dropped.
    PageInvalidated { key: PageKey },
    /// Every cached entry was explicitly dropped.
    Invalidated,
}

impl GalleryEventKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PageUpdated { .. } => "page_updated",
            Self::PageRefreshFailed { .. } => "page_refresh_failed",
            Self::ItemUpdated { .. } => "item_updated",
            Self::ItemRefreshFailed { .. } => "item_refresh_failed",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::PageInvalidated { .. } => "page_invalidated",
            Self::Invalidated => "invalidated",
        }
    }
}

/// Cache event with idempotency and ordering support.
#[derive(Debug, Clone)]
pub struct GalleryEvent {
    /// Unique identifier for idempotency (UUIDv4).
    pub id: Uuid,
    /// Monotonic epoch for ordering within this process.
    pub epoch: Epoch,
    /// When the event was created.
    pub occurred_at: OffsetDateTime,
    /// What happened.
    pub kind: GalleryEventKind,
}

impl GalleryEvent {
    fn new(kind: GalleryEventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            occurred_at: OffsetDateTime::now_utc(),
            kind,
        }
    }
}

/// Broadcast fan-out for [`GalleryEvent`]s.
///
/// Cheap to clone; all clones share one channel and one epoch counter.
/// Slow consumers that fall more than the configured capacity behind
/// observe a lag error from their receiver rather than blocking
/// publishers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GalleryEvent>,
    epoch_counter: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            epoch_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get the next epoch number.
    fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish an event to every current subscriber.
    ///
    /// The event is logged for observability; the assigned epoch is
    /// returned so callers can correlate.
    pub fn publish(&self, kind: GalleryEventKind) -> Epoch {
        let epoch = self.next_epoch();
        let event = GalleryEvent::new(kind, epoch);
        let event_id = event.id;
        let event_kind = event.kind.label();

        counter!(METRIC_EVENT_PUBLISHED).increment(1);
        match self.tx.send(event) {
            Ok(receivers) => debug!(
                event_id = %event_id,
                event_epoch = epoch,
                event_kind,
                receivers,
                "Published gallery event"
            ),
            Err(_) => debug!(
                event_id = %event_id,
                event_epoch = epoch,
                event_kind,
                "Published gallery event with no subscribers"
            ),
        }
        epoch
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.tx.subscribe()
    }
}
