//! Error types for the import engine.

use thiserror::Error;

use crate::feeds::FeedError;
use crate::models::ValidationError;

/// Top-level error for import engine operations.
///
/// Most failures inside a run are converted into durable step records rather
/// than surfaced here; callers of the engine only see errors that prevent the
/// run itself from being recorded (missing feed, storage failure).
#[derive(Debug, Error)]
pub enum Error {
    #[error("feed not found: {0}")]
    FeedNotFound(String),

    #[error("video not found: {0}")]
    VideoNotFound(String),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}
