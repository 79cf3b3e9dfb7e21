//! Language model providers used for recipe generation and pantry scans.

mod client;
mod fake;

pub use client::ChatProvider;
pub use fake::FakeProvider;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// An image handed to a vision capable model.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64 payload without the `data:` prefix.
    pub data: String,
    pub mime_type: String,
}

impl ImageInput {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt and return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Same as [`LlmProvider::complete`] with an attached image.
    async fn complete_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, LlmError>;

    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Builds the provider named by `Config::llm_provider`: `"openai"` or `"fake"`.
pub fn create_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.llm_provider.as_str() {
        "fake" => {
            log::warn!("Using the fake language model provider");
            Ok(Arc::new(FakeProvider::default()))
        }
        "openai" => {
            let api_key = config
                .llm_api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("LLM_API_KEY not set".to_string()))?;

            log::info!(
                "Using chat completions at {} with {}",
                config.llm_base_url,
                config.llm_model
            );
            Ok(Arc::new(ChatProvider::new(
                api_key,
                config.llm_base_url.clone(),
                config.llm_model.clone(),
            )))
        }
        other => Err(LlmError::NotConfigured(format!("Unknown provider: {other}"))),
    }
}
