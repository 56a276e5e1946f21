//! Image synthesis client
//!
//! Turns a text prompt into PNG bytes via a remote text-to-image endpoint.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::ImageClient;
pub use error::ImageError;
pub use openai::OpenAIImageClient;
pub use types::ImageSize;

use crate::config::ImageConfig;

/// Create the image client described by the config
pub fn create_client(config: &ImageConfig) -> Result<Arc<dyn ImageClient>, ImageError> {
    debug!(model = %config.model, base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(OpenAIImageClient::from_config(config)?))
}
