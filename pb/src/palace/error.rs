//! Palace generation errors

use thiserror::Error;

use crate::media::MediaError;
use crate::state::StateError;

#[derive(Debug, Error)]
pub enum PalaceError {
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Prompt error: {0}")]
    Prompt(String),
}
