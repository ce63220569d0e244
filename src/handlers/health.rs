//! Health check endpoint

use crate::handlers::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::json;

/// GET /health
///
/// Reports overall status plus a per-key health snapshot. Secrets are never
/// included, only positional indexes.
pub async fn handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let statuses = state.pool().statuses().await;
    let available = statuses.iter().filter(|s| s.is_available()).count();

    let keys: Vec<serde_json::Value> = statuses
        .iter()
        .enumerate()
        .map(|(index, status)| {
            json!({
                "index": index,
                "errorCount": status.error_count(),
                "consecutiveErrors": status.consecutive_errors(),
                "blacklisted": status.is_blacklisted(),
            })
        })
        .collect();

    let status = if available > 0 { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "totalKeys": statuses.len(),
        "availableKeys": available,
        "keys": keys,
    }))
}
