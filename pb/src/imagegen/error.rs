//! Image generation error types

use thiserror::Error;

/// Errors that can occur while generating an image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Response contained no image data")]
    EmptyResponse,

    #[error("Invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Invalid image size '{0}', expected WIDTHxHEIGHT")]
    InvalidSize(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
