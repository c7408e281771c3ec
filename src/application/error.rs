//! Application-level error types.

use thiserror::Error;

use crate::application::source::SourceError;

/// Errors surfaced by the gallery facade.
///
/// Staleness is never an error: stale entries are served with their
/// state marked, and a missing selection resolves to `None` rather than
/// failing. What remains is bad caller input and backend failures with
/// nothing cached to fall back on.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl GalleryError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
