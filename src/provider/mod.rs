//! Upstream Gemini client
//!
//! [`GenerateBackend`] is the seam the orchestrator calls through; tests
//! substitute scripted implementations, production uses [`GeminiBackend`]
//! over reqwest.

mod types;

pub use types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};

use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::time::Duration;

/// One attempt against the upstream provider with a specific API key.
///
/// Implementations return the raw response text; empty or missing content is
/// an error (the caller treats it as retryable via the message-substring
/// rule).
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    async fn generate(&self, api_key: &str, request: &GenerateContentRequest)
    -> AppResult<String>;
}

/// HTTP client for the Gemini generateContent endpoint
pub struct GeminiBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    /// Build a client with the given per-request timeout.
    ///
    /// The orchestrator additionally bounds each attempt; the client timeout
    /// is a backstop for connection establishment.
    pub fn new(provider: &ProviderConfig, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            model: provider.model.clone(),
        })
    }
}

#[async_trait]
impl GenerateBackend for GeminiBackend {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> AppResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        // The key travels as a query parameter; never log the full URL.
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(500).collect();
            return Err(AppError::provider(format!(
                "provider returned {}: {}",
                status, detail
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(format!("failed to parse provider response: {}", e)))?;

        let text = parsed.text();
        if text.is_empty() {
            return Err(AppError::provider("empty response from Gemini API"));
        }
        if text.trim().is_empty() {
            return Err(AppError::provider("empty text response from AI"));
        }

        Ok(text)
    }
}
