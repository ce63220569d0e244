//! Request orchestration
//!
//! Drives one logical generate request through the retry loop: select a
//! key, invoke the provider, classify the outcome, update key health, and
//! either retry or stop. Bounded at `2 × pool size` attempts so a wedged
//! provider cannot loop forever.

use crate::classify::{self, ErrorKind};
use crate::error::{AppError, AppResult};
use crate::keys::{ExclusionSet, KeyIndex, KeyPool};
use crate::metrics::Metrics;
use crate::provider::{GenerateBackend, GenerateContentRequest};
use std::sync::Arc;
use std::time::Duration;

/// Successful outcome of an orchestrated request
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub key_index: KeyIndex,
}

/// Retry driver over the key pool and a provider backend.
pub struct Orchestrator {
    pool: Arc<KeyPool>,
    backend: Arc<dyn GenerateBackend>,
    metrics: Metrics,
    attempt_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        pool: Arc<KeyPool>,
        backend: Arc<dyn GenerateBackend>,
        metrics: Metrics,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            backend,
            metrics,
            attempt_timeout,
        }
    }

    /// Run one generate request to completion.
    ///
    /// Keys already tried in this call are excluded from selection while
    /// untried keys remain; once every candidate has been tried the
    /// exclusions are cleared so remaining attempts can revisit keys (a
    /// single-key pool gets its second attempt this way). A selection that
    /// still fails after the clear means every key is blacklisted and the
    /// request ends as unavailable. Service-classified failures back off
    /// exponentially, capped at 5s; quota and rate-limit failures rotate to
    /// another key immediately.
    pub async fn generate(&self, request: &GenerateContentRequest) -> AppResult<Generation> {
        let max_attempts = 2 * self.pool.len();
        let mut tried = ExclusionSet::new();
        let mut last_error: Option<AppError> = None;

        for attempt in 0..max_attempts {
            let Some(index) = self.select_for_attempt(&mut tried).await else {
                // A failed selection means every key is blacklisted or the
                // pool ran dry mid-call; that outcome outranks whatever the
                // last attempt reported.
                tracing::warn!(attempt, "no API key available for selection");
                return Err(AppError::AllKeysUnavailable);
            };
            tried.insert(index);

            tracing::debug!(
                attempt = attempt + 1,
                max_attempts,
                key_index = index.get(),
                "invoking provider"
            );

            match self.invoke(index, request).await {
                Ok(text) => {
                    self.pool.record_success(index).await;
                    return Ok(Generation {
                        text,
                        key_index: index,
                    });
                }
                Err(error) => {
                    let message = error.to_string();
                    let kind = classify::classify(&message);
                    self.metrics.record_provider_error(kind);

                    if self.pool.record_failure(index, kind).await {
                        self.metrics.record_blacklist();
                    }

                    tracing::warn!(
                        attempt = attempt + 1,
                        key_index = index.get(),
                        error_kind = %kind,
                        error = %message,
                        "provider attempt failed"
                    );

                    if !classify::is_retryable(kind, &message) {
                        return Err(error);
                    }

                    let attempts_remain = attempt + 1 < max_attempts;
                    if attempts_remain && kind == ErrorKind::Service {
                        let delay = backoff_delay(attempt);
                        tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }

                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(AppError::AllKeysUnavailable))
    }

    /// Select the next key, excluding keys tried in this call until every
    /// candidate has been used once.
    async fn select_for_attempt(&self, tried: &mut ExclusionSet) -> Option<KeyIndex> {
        if let Some(index) = self.pool.select(tried).await {
            return Some(index);
        }
        if tried.is_empty() {
            return None;
        }
        // Every available key has had a turn; open a fresh round.
        tried.clear();
        self.pool.select(tried).await
    }

    async fn invoke(&self, index: KeyIndex, request: &GenerateContentRequest) -> AppResult<String> {
        let secret = self.pool.secret(index);
        match tokio::time::timeout(self.attempt_timeout, self.backend.generate(secret, request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::provider(format!(
                "provider request timed out after {}s",
                self.attempt_timeout.as_secs()
            ))),
        }
    }
}

/// Exponential backoff for service errors: 1s, 2s, 4s, then capped at 5s.
fn backoff_delay(attempt: usize) -> Duration {
    let exp = u32::try_from(attempt).unwrap_or(u32::MAX).min(16);
    let millis = 1000u64.saturating_mul(1u64 << exp).min(5000);
    Duration::from_millis(millis)
}
