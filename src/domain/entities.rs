//! Concrete content records shipped with the crate.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{ContentItem, ItemId};

/// A published gallery image as supplied by a CMS backend.
///
/// The cache itself is generic over [`ContentItem`]; this record is the
/// reference implementation used by the test suite and by embedders that
/// do not need their own item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ItemId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub placeholder_data_url: Option<String>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub uploaded_by: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub is_published: bool,
}

impl ContentItem for ImageRecord {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn revision(&self) -> Option<OffsetDateTime> {
        Some(self.updated_at)
    }
}
