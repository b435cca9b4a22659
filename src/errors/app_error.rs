//! Top-level error type unifying the subsystem errors.

use crate::core::catalog::CatalogError;
use crate::core::paging::PagingError;
use crate::core::speech::PlaybackError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Paging error: {0}")]
    Paging(#[from] PagingError),
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
