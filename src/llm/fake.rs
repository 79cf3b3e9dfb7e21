//! Deterministic provider for tests and local development.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ImageInput, LlmError, LlmProvider};

/// Answers by matching registered substrings against the prompt, case-insensitively.
#[derive(Debug)]
pub struct FakeProvider {
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    calls: AtomicUsize,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            default_response: Some("{}".to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeProvider {
    /// A provider with no responses. Unmatched prompts fail.
    pub fn new() -> Self {
        Self {
            default_response: None,
            ..Self::default()
        }
    }

    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
        self
    }

    /// Number of prompts answered so far, failures included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt_lower = prompt.to_lowercase();

        // Registration order decides between overlapping patterns.
        if let Some((_, response)) = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern))
        {
            return Ok(response.clone());
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.respond(prompt)
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        _image: &ImageInput,
    ) -> Result<String, LlmError> {
        self.respond(prompt)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
