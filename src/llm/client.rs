//! Chat completions provider for OpenAI compatible endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ImageInput, LlmError, LlmProvider};

#[derive(Debug)]
pub struct ChatProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl ChatProvider {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, content: Value) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.7,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if status != 200 {
            let message = serde_json::from_str::<ChatErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::ApiError { status, message });
        }

        let response: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::ParseError(e.to_string()))?;

        response
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| LlmError::ParseError("No text content in response".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatApiError {
    message: String,
}

#[derive(Deserialize)]
struct ChatErrorResponse {
    error: ChatApiError,
}

#[async_trait]
impl LlmProvider for ChatProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.send(Value::String(prompt.to_string())).await
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, LlmError> {
        self.send(json!([
            { "type": "text", "text": prompt },
            { "type": "image_url", "image_url": { "url": image.data_url() } }
        ]))
        .await
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
