//! HTTP request handlers

use crate::config::Config;
use crate::error::AppResult;
use crate::keys::KeyPool;
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::orchestrator::Orchestrator;
use crate::provider::{GenerateBackend, GeminiBackend};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod describe;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: Arc<KeyPool>,
    orchestrator: Arc<Orchestrator>,
    metrics: Metrics,
}

impl AppState {
    /// Create state for production use, with the real Gemini backend.
    pub fn new(config: Config, keys: Vec<Option<String>>) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.server.request_timeout_seconds);
        let backend = Arc::new(GeminiBackend::new(&config.provider, timeout)?);
        Self::with_backend(config, keys, backend)
    }

    /// Create state with an explicit backend implementation.
    pub fn with_backend(
        config: Config,
        keys: Vec<Option<String>>,
        backend: Arc<dyn GenerateBackend>,
    ) -> AppResult<Self> {
        let config = Arc::new(config);
        let pool = Arc::new(KeyPool::new(keys)?);
        let metrics = Metrics::new()
            .map_err(|e| crate::error::AppError::Internal(format!("metrics setup failed: {}", e)))?;
        let timeout = Duration::from_secs(config.server.request_timeout_seconds);
        let orchestrator = Arc::new(Orchestrator::new(
            pool.clone(),
            backend,
            metrics.clone(),
            timeout,
        ));

        Ok(Self {
            config,
            pool,
            orchestrator,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &Arc<KeyPool> {
        &self.pool
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the application router with all routes and middleware.
///
/// CORS is fully permissive: the extension calls from arbitrary page
/// origins.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/describe", post(describe::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
