//! OpenAI-compatible image generation client
//!
//! Talks to `/v1/images/generations` and asks for base64 PNG output. The
//! provider-specific knobs (width, height, steps, negative prompt, seed) ride
//! along as extra body fields, which OpenAI-compatible gateways accept.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{ImageClient, ImageError, ImageSize};
use crate::config::ImageConfig;

/// Seed value asking the provider for a random seed
const RANDOM_SEED: i64 = -1;

/// OpenAI-compatible image client
pub struct OpenAIImageClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    steps: u32,
    negative_prompt: String,
}

impl OpenAIImageClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ImageConfig) -> Result<Self, ImageError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config.get_api_key().map_err(|e| ImageError::Config(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ImageError::Network)?;

        Ok(Self::new(
            http,
            &config.base_url,
            api_key,
            &config.model,
            config.steps,
            &config.negative_prompt,
        ))
    }

    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        steps: u32,
        negative_prompt: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            steps,
            negative_prompt: negative_prompt.into(),
        }
    }

    /// Build the request body for the images API
    fn build_request_body(&self, prompt: &str, size: ImageSize) -> serde_json::Value {
        debug!(%self.model, %size, "build_request_body: called");
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "response_format": "b64_json",
            "response_extension": "png",
            "width": size.width,
            "height": size.height,
            "num_inference_steps": self.steps,
            "negative_prompt": self.negative_prompt,
            "seed": RANDOM_SEED,
        })
    }

    /// Perform the request, surfacing every failure as an ImageError
    async fn try_generate(&self, prompt: &str, size: ImageSize) -> Result<Vec<u8>, ImageError> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let body = self.build_request_body(prompt, size);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: ImagesResponse = response.json().await?;
        let b64 = api_response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or(ImageError::EmptyResponse)?;

        Ok(BASE64.decode(b64.trim())?)
    }
}

#[async_trait]
impl ImageClient for OpenAIImageClient {
    async fn generate(&self, prompt: &str, size: ImageSize) -> Option<Vec<u8>> {
        let preview: String = prompt.chars().take(100).collect();
        debug!(%size, prompt = %preview, "generate: called");

        match self.try_generate(prompt, size).await {
            Ok(bytes) => {
                info!(bytes = bytes.len(), "Image generated");
                Some(bytes)
            }
            Err(e) => {
                error!(error = %e, "Image generation failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}
