//! Gallery cache configuration.

use std::num::NonZeroUsize;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use time::Duration;

pub const DEFAULT_TTL_MS: u64 = 60_000;
pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const DEFAULT_PAGE_CACHE_LIMIT: usize = 64;
pub const DEFAULT_ITEM_CACHE_LIMIT: usize = 256;
pub const DEFAULT_EVENT_CAPACITY: usize = 128;

const CONFIG_BASENAME: &str = "galleria";
const ENV_PREFIX: &str = "GALLERIA";

/// How a stale entry is refreshed when a caller observes it.
///
/// `Background` serves the stale data immediately and refreshes behind
/// the request (stale-while-revalidate). `Blocking` makes the observing
/// caller wait for the refresh, falling back to the stale data only
/// when the refresh fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    #[default]
    Background,
    Blocking,
}

/// Tunables for the page/item caches.
///
/// ```toml
/// ttl_ms = 60000
/// page_size = 12
/// page_cache_limit = 64
/// item_cache_limit = 256
/// event_capacity = 128
/// refresh_mode = "background"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Entry lifetime before it is considered stale, in milliseconds.
    pub ttl_ms: u64,
    /// Default page size used by `GalleryService::list`.
    pub page_size: u32,
    /// Maximum number of cached pages (LRU-evicted beyond this).
    pub page_cache_limit: usize,
    /// Maximum number of cached by-id resolutions.
    pub item_cache_limit: usize,
    /// Buffered capacity of the event channel.
    pub event_capacity: usize,
    /// Stale-refresh policy.
    pub refresh_mode: RefreshMode,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            page_size: DEFAULT_PAGE_SIZE,
            page_cache_limit: DEFAULT_PAGE_CACHE_LIMIT,
            item_cache_limit: DEFAULT_ITEM_CACHE_LIMIT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            refresh_mode: RefreshMode::default(),
        }
    }
}

impl GalleryConfig {
    /// Entry lifetime as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::milliseconds(self.ttl_ms.min(i64::MAX as u64) as i64)
    }

    pub fn page_cache_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_cache_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn item_cache_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.item_cache_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Reject configurations that cannot express a working cache.
    pub fn validate(&self) -> Result<(), GalleryConfigError> {
        if self.ttl_ms == 0 {
            return Err(GalleryConfigError::invalid("ttl_ms must be >= 1"));
        }
        if self.page_size == 0 {
            return Err(GalleryConfigError::invalid("page_size must be >= 1"));
        }
        if self.page_cache_limit == 0 {
            return Err(GalleryConfigError::invalid("page_cache_limit must be >= 1"));
        }
        if self.item_cache_limit == 0 {
            return Err(GalleryConfigError::invalid("item_cache_limit must be >= 1"));
        }
        if self.event_capacity == 0 {
            return Err(GalleryConfigError::invalid("event_capacity must be >= 1"));
        }
        Ok(())
    }

    /// Load configuration from layered sources.
    ///
    /// Layering, lowest to highest precedence: built-in defaults, an
    /// optional `galleria.toml` in the working directory, an explicit
    /// file when `path` is given, then `GALLERIA__*` environment
    /// variables (e.g. `GALLERIA__TTL_MS=30000`).
    pub fn load(path: Option<&Path>) -> Result<Self, GalleryConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name(CONFIG_BASENAME).required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum GalleryConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl GalleryConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
