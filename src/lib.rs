//! Galleria
//!
//! A stale-while-revalidate cache for paginated content sitting behind
//! a slow or flaky backend:
//!
//! - **Reads never wait on freshness**: anything cached is served
//!   immediately, and entries past their TTL are refreshed through
//!   per-key single-flight fetches.
//! - **Failures degrade, never regress**: a failed refresh keeps the
//!   previous data serving, annotated with the error; only a miss with
//!   a failing backend surfaces an error at all.
//! - **Selection is sticky**: the selected item id survives pagination,
//!   refreshes, and invalidation, and resolves to the freshest cached
//!   copy wherever it appears.
//!
//! The backend is abstracted behind [`ContentSource`]; any `Clone`
//! type with a stable id can be cached by implementing [`ContentItem`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use galleria::{
//!     ContentItem, ContentSource, GalleryConfig, GalleryService, ItemId, SourceError,
//!     SourcePage,
//! };
//!
//! #[derive(Clone)]
//! struct Caption {
//!     id: ItemId,
//!     text: String,
//! }
//!
//! impl ContentItem for Caption {
//!     fn id(&self) -> &ItemId {
//!         &self.id
//!     }
//! }
//!
//! struct CaptionBackend;
//!
//! #[async_trait]
//! impl ContentSource for CaptionBackend {
//!     type Item = Caption;
//!
//!     async fn fetch_page(
//!         &self,
//!         page_number: u32,
//!         page_size: u32,
//!     ) -> Result<SourcePage<Caption>, SourceError> {
//!         // Call the real backend here.
//!         Ok(SourcePage { items: Vec::new(), total_count: 0 })
//!     }
//!
//!     async fn fetch_by_id(&self, id: &ItemId) -> Result<Option<Caption>, SourceError> {
//!         Ok(None)
//!     }
//! }
//!
//! # async fn run() -> Result<(), galleria::GalleryError> {
//! let gallery: GalleryService<Caption> =
//!     GalleryService::new(Arc::new(CaptionBackend), GalleryConfig::default());
//!
//! let page = gallery.list_page(1, 12).await?;
//! println!("{} of {} items", page.len(), page.total_count);
//!
//! gallery.select("caption-3");
//! if let Some(caption) = gallery.current_selection().await {
//!     println!("selected: {}", caption.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod cache;
pub mod domain;
pub mod telemetry;

pub use application::error::GalleryError;
pub use application::gallery::GalleryService;
pub use application::pagination::PageResult;
pub use application::source::{ContentSource, SourceError, SourcePage};
pub use cache::{
    ContentStore, EntryState, EventBus, GalleryConfig, GalleryConfigError, GalleryEvent,
    GalleryEventKind, PageKey, RefreshMode,
};
pub use domain::entities::ImageRecord;
pub use domain::types::{ContentItem, ItemId};
