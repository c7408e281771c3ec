//! Galleria Cache System
//!
//! Provides stale-while-revalidate caching for paginated content:
//!
//! - **Page table**: Caches whole pages keyed by (page number, page size)
//! - **Item table**: Caches by-id resolutions, including negative answers
//!
//! Reads are served from cache whenever anything is cached, regardless
//! of age; entries past their TTL trigger a single-flight refresh that
//! swaps the entry in atomically. Selection state lives beside the
//! tables and survives every refresh and invalidation.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `galleria.toml`:
//!
//! ```toml
//! ttl_ms = 60000
//! page_size = 12
//! page_cache_limit = 64
//! refresh_mode = "background"
//! # ... see config.rs for all options
//! ```

mod config;
mod entry;
mod events;
mod keys;
mod lock;
mod memo;
mod revalidate;
mod selection;
mod store;

pub use config::{
    DEFAULT_EVENT_CAPACITY, DEFAULT_ITEM_CACHE_LIMIT, DEFAULT_PAGE_CACHE_LIMIT, DEFAULT_PAGE_SIZE,
    DEFAULT_TTL_MS, GalleryConfig, GalleryConfigError, RefreshMode,
};
pub use entry::{EntryState, ItemEntry, PageEntry};
pub use events::{Epoch, EventBus, GalleryEvent, GalleryEventKind};
pub use keys::PageKey;
pub use memo::MemoCell;
pub(crate) use selection::SelectionTracker;
pub use store::{ContentStore, ItemSnapshot, PageSnapshot};
