//! Prometheus metrics endpoint

use crate::handlers::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// GET /metrics
///
/// Renders the process metrics in Prometheus text exposition format.
pub async fn handler(State(state): State<AppState>) -> Response {
    match state.metrics().gather() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(error = %error, "failed to gather metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to gather metrics",
            )
                .into_response()
        }
    }
}
