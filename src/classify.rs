//! Provider error classification
//!
//! The upstream SDK-less REST surface exposes no structured error codes, so
//! failures are bucketed by case-insensitive substring checks against the
//! error message. This is an ordered rule list: first match wins. Keep it a
//! rule list; do not grow it into a parser.

use serde::Serialize;

/// Coarse category of a provider failure, used to decide retryability and
/// backoff behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Daily/project quota exhausted for the key ("quota", "429")
    Quota,
    /// Short-term request-rate limiting ("rate limit")
    RateLimit,
    /// Upstream capacity problems ("503", "overload", "service unavailable",
    /// and per-attempt timeouts)
    Service,
    /// Everything else; not retryable unless the empty-response rule applies
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quota => "quota",
            Self::RateLimit => "rate_limit",
            Self::Service => "service",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a provider error message into an [`ErrorKind`].
///
/// Deterministic and case-insensitive.
pub fn classify(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();

    if lower.contains("quota") || lower.contains("429") {
        return ErrorKind::Quota;
    }
    if lower.contains("rate limit") {
        return ErrorKind::RateLimit;
    }
    if lower.contains("503")
        || lower.contains("overload")
        || lower.contains("service unavailable")
        || lower.contains("timed out")
    {
        return ErrorKind::Service;
    }
    ErrorKind::Other
}

/// Whether another attempt (possibly with a different key) is permitted for
/// this failure.
///
/// Quota, rate-limit, and service failures are always retryable. An `Other`
/// failure is retryable only when the provider call nominally succeeded but
/// returned no content ("empty response" / "empty text").
pub fn is_retryable(kind: ErrorKind, message: &str) -> bool {
    match kind {
        ErrorKind::Quota | ErrorKind::RateLimit | ErrorKind::Service => true,
        ErrorKind::Other => {
            let lower = message.to_lowercase();
            lower.contains("empty response") || lower.contains("empty text")
        }
    }
}
