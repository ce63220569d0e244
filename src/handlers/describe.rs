//! The `/api/describe` endpoint
//!
//! Accepts an optional screen capture (data URL) plus an optional prompt,
//! runs the generate request through the orchestrator, and returns the
//! extension's JSON envelope.

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::metrics::Outcome;
use crate::postprocess;
use crate::prompt::{self, PromptInput};
use crate::provider::{Content, GenerateContentRequest, GenerationConfig, Part};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Instant;

static DATA_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:([^;,]+);base64,(.*)$").expect("data URL regex"));

/// Inbound request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeRequest {
    /// Screen capture as a base64 data URL
    pub image: Option<String>,
    pub prompt: Option<String>,
    pub conversation_history: Option<String>,
    pub current_url: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Json(body): Json<DescribeRequest>,
) -> AppResult<Response> {
    let started = Instant::now();

    let prompt_text = body.prompt.as_deref().unwrap_or("").trim().to_string();
    let has_image = body.image.as_deref().is_some_and(|i| !i.trim().is_empty());

    if prompt_text.is_empty() && !has_image {
        return Err(AppError::Validation(
            "Either prompt or image is required".to_string(),
        ));
    }

    let input = PromptInput {
        prompt: prompt_text,
        conversation_history: body
            .conversation_history
            .filter(|h| !h.trim().is_empty()),
        current_url: body.current_url.filter(|u| !u.trim().is_empty()),
        has_image,
    };

    let max_tokens = prompt::max_output_tokens(&input);
    let instruction = prompt::build(&input);

    let mut parts = Vec::new();
    if let Some(image) = body.image.as_deref().filter(|i| !i.trim().is_empty()) {
        let (mime_type, data) = split_data_url(image);
        parts.push(Part::inline_image(mime_type, data));
    }
    parts.push(Part::text(instruction));

    let provider = &state.config().provider;
    let request = GenerateContentRequest {
        contents: vec![Content::user(parts)],
        generation_config: GenerationConfig {
            temperature: provider.temperature,
            top_k: provider.top_k,
            top_p: provider.top_p,
            max_output_tokens: max_tokens,
        },
    };

    let result = state.orchestrator().generate(&request).await;
    state
        .metrics()
        .observe_request_duration(started.elapsed().as_secs_f64());

    match result {
        Ok(generation) => {
            state.metrics().record_request(Outcome::Success);
            let text = postprocess::process(&generation.text);

            tracing::info!(
                key_index = generation.key_index.get(),
                mode = input.mode(),
                tokens = max_tokens,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "describe request served"
            );

            Ok(Json(serde_json::json!({
                "text": text,
                "success": true,
                "keyIndex": generation.key_index.get(),
                "mode": input.mode(),
                "tokensUsed": max_tokens,
            }))
            .into_response())
        }
        Err(error) => {
            state.metrics().record_request(Outcome::Failure);

            tracing::error!(
                error = %error,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "describe request failed"
            );

            let mut body = serde_json::json!({
                "error": error.user_message(),
                "success": false,
            });
            if state.config().observability.expose_technical_errors {
                body["technicalError"] = serde_json::Value::String(error.to_string());
            }

            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

/// Split a base64 data URL into its MIME type and payload.
///
/// Captures without the `data:` prefix are treated as raw base64 PNG data,
/// matching what older extension builds send.
fn split_data_url(image: &str) -> (String, String) {
    match DATA_URL.captures(image) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => ("image/png".to_string(), image.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_well_formed_data_url() {
        let (mime, data) = split_data_url("data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(mime, "image/jpeg");
        assert_eq!(data, "aGVsbG8=");
    }

    #[test]
    fn test_split_bare_base64_defaults_to_png() {
        let (mime, data) = split_data_url("aGVsbG8=");
        assert_eq!(mime, "image/png");
        assert_eq!(data, "aGVsbG8=");
    }

    #[test]
    fn test_request_body_accepts_camel_case() {
        let body: DescribeRequest = serde_json::from_str(
            r#"{
                "prompt": "what is this",
                "conversationHistory": "User: hi\nAI: hello",
                "currentUrl": "https://example.com"
            }"#,
        )
        .expect("should deserialize");
        assert_eq!(body.prompt.as_deref(), Some("what is this"));
        assert!(body.conversation_history.is_some());
        assert_eq!(body.current_url.as_deref(), Some("https://example.com"));
        assert!(body.image.is_none());
    }
}
