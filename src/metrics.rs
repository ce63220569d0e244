//! Prometheus metrics collection
//!
//! Tracks request outcomes, provider error categories, and blacklist
//! transitions. Exposed via the `/metrics` endpoint in Prometheus text
//! format.

use crate::classify::ErrorKind;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Outcome label for a finished request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Metrics collector shared across handlers.
///
/// Recording failures are logged, never propagated: observability problems
/// must not fail user requests.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    provider_errors_total: IntCounterVec,
    keys_blacklisted_total: IntCounter,
    request_duration: Histogram,
}

impl Metrics {
    /// Create a collector backed by a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 2 outcomes = 2 time series
        let requests_total = IntCounterVec::new(
            Opts::new(
                "screenwing_requests_total",
                "Total describe requests by outcome",
            ),
            &["outcome"],
        )?;

        // Cardinality: 4 error kinds = 4 time series
        let provider_errors_total = IntCounterVec::new(
            Opts::new(
                "screenwing_provider_errors_total",
                "Total provider call failures by classified kind",
            ),
            &["kind"],
        )?;

        let keys_blacklisted_total = IntCounter::new(
            "screenwing_keys_blacklisted_total",
            "Total API key blacklist transitions",
        )?;

        let request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "screenwing_request_duration_seconds",
                "End-to-end describe request latency in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(provider_errors_total.clone()))?;
        registry.register(Box::new(keys_blacklisted_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            provider_errors_total,
            keys_blacklisted_total,
            request_duration,
        })
    }

    pub fn record_request(&self, outcome: Outcome) {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn record_provider_error(&self, kind: ErrorKind) {
        self.provider_errors_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn record_blacklist(&self) {
        self.keys_blacklisted_total.inc();
    }

    pub fn observe_request_duration(&self, seconds: f64) {
        self.request_duration.observe(seconds);
    }

    /// Render all registered metrics in Prometheus text exposition format.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics output was not UTF-8: {}", e)))
    }
}
