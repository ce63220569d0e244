//! Per-key health state
//!
//! One record per configured key, created at pool construction and mutated
//! for the lifetime of the process. Counters are heuristic: concurrent
//! requests may race on increments, which is acceptable.

use super::pool::PoolLimits;
use std::time::Instant;

/// Health status for a single API key
///
/// Fields are private so that state transitions only happen through the
/// record/refresh methods; blacklisting stays sticky until time-based
/// rehabilitation clears it.
#[derive(Clone, Debug)]
pub struct KeyHealth {
    error_count: u32,
    consecutive_errors: u32,
    last_error_at: Option<Instant>,
    blacklisted: bool,
}

impl KeyHealth {
    pub(crate) fn new() -> Self {
        Self {
            error_count: 0,
            consecutive_errors: 0,
            last_error_at: None,
            blacklisted: false,
        }
    }

    /// Total errors since the last reset window
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Errors since the last success
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Whether the key is currently excluded from selection
    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted
    }

    /// Whether the key is a selection candidate
    pub fn is_available(&self) -> bool {
        !self.blacklisted
    }

    /// Record a failed attempt. Returns true if this failure newly
    /// blacklisted the key.
    pub(crate) fn record_failure(&mut self, now: Instant, limits: &PoolLimits) -> bool {
        self.error_count += 1;
        self.consecutive_errors += 1;
        self.last_error_at = Some(now);

        if !self.blacklisted && self.consecutive_errors >= limits.max_consecutive_errors {
            self.blacklisted = true;
            return true;
        }
        false
    }

    /// Record a successful attempt: consecutive errors reset, total count
    /// is left for the decay window to clear.
    pub(crate) fn record_success(&mut self) {
        self.consecutive_errors = 0;
    }

    /// Apply time-based expiry. Returns true if the key was rehabilitated
    /// off the blacklist.
    ///
    /// Blacklisted keys recover fully once `blacklist_duration` has passed
    /// since the last error. Non-blacklisted keys shed stale counters after
    /// `error_reset`.
    pub(crate) fn refresh(&mut self, now: Instant, limits: &PoolLimits) -> bool {
        let Some(last_error) = self.last_error_at else {
            return false;
        };
        let elapsed = now.saturating_duration_since(last_error);

        if self.blacklisted {
            if elapsed > limits.blacklist_duration {
                self.blacklisted = false;
                self.error_count = 0;
                self.consecutive_errors = 0;
                return true;
            }
        } else if elapsed > limits.error_reset {
            self.error_count = 0;
            self.consecutive_errors = 0;
        }
        false
    }
}
