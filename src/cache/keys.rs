//! Cache key types.

use std::fmt;

use crate::application::error::GalleryError;

/// Addressable unit of page caching: 1-based page number plus page size.
///
/// Both fields are validated at construction, so a `PageKey` held
/// anywhere in the system is known to describe a real page. Two keys are
/// equal iff both fields are equal; requesting the same page at a
/// different size is a distinct cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageKey {
    page_number: u32,
    page_size: u32,
}

impl PageKey {
    /// Build a key, rejecting non-positive page numbers or sizes.
    pub fn new(page_number: u32, page_size: u32) -> Result<Self, GalleryError> {
        if page_number == 0 {
            return Err(GalleryError::invalid_input("page_number must be >= 1"));
        }
        if page_size == 0 {
            return Err(GalleryError::invalid_input("page_size must be >= 1"));
        }
        Ok(Self {
            page_number,
            page_size,
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Zero-based index of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }

    /// Whether a further page exists in a collection of `total_count` items.
    pub fn has_next(&self, total_count: u64) -> bool {
        u64::from(self.page_number) * u64::from(self.page_size) < total_count
    }

    /// Whether a previous page exists.
    pub fn has_prev(&self) -> bool {
        self.page_number > 1
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.page_number, self.page_size)
    }
}
