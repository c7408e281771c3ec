//! Application services layer: consumer-facing surfaces over the cache.

pub mod error;
pub mod gallery;
pub mod pagination;
pub mod source;
