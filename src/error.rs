//! Error types for the Screenwing relay
//!
//! All errors implement `IntoResponse` for Axum handlers. Responses use the
//! extension's JSON envelope: `{ "error": ..., "success": false }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    /// A failed call to the upstream AI provider. The message is the raw
    /// technical detail; classification and user-facing translation both
    /// work from it.
    #[error("{message}")]
    Provider { message: String },

    #[error("all API keys are temporarily unavailable")]
    AllKeysUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a provider failure carrying a technical message.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Translate this error into the fixed user-facing string shown to the
    /// extension. Technical detail never leaks through this path.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::AllKeysUnavailable => {
                "All our AI services are temporarily unavailable. Please try again in a few minutes."
                    .to_string()
            }
            Self::Provider { message } => friendly_provider_message(message),
            Self::Config(_) | Self::Internal(_) => {
                "Something went wrong while processing your request. Please try again.".to_string()
            }
        }
    }
}

/// Map a technical provider error message onto a user-facing string.
///
/// First match wins, mirroring the classifier's ordered-rule approach.
fn friendly_provider_message(technical: &str) -> String {
    let lower = technical.to_lowercase();

    if lower.contains("quota") || lower.contains("429") {
        return "Our AI service quota has been reached. Please try again in a few minutes."
            .to_string();
    }
    if lower.contains("rate limit") {
        return "Too many requests at the moment. Please wait a few seconds and try again."
            .to_string();
    }
    if lower.contains("503")
        || lower.contains("overload")
        || lower.contains("service unavailable")
        || lower.contains("timed out")
    {
        return "The AI service is temporarily busy. Please try again in a moment.".to_string();
    }
    if lower.contains("empty response") || lower.contains("empty text") {
        return "The AI didn't provide a response. Please try rephrasing your question."
            .to_string();
    }
    if lower.contains("all api keys") {
        return "All our AI services are temporarily unavailable. Please try again in a few minutes."
            .to_string();
    }
    if lower.contains("safety") {
        return "The content was blocked by safety filters. Please try rephrasing your question."
            .to_string();
    }
    if lower.contains("token") && lower.contains("limit") {
        return "The response was too long. Please try asking a more specific question."
            .to_string();
    }

    "Something went wrong while processing your request. Please try again.".to_string()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::Provider { .. }
            | Self::AllKeysUnavailable
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.user_message(),
            "success": false,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
