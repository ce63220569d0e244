//! Key pool and selection
//!
//! The pool is an injectable service object, not process-global state:
//! handlers hold it behind an `Arc`, tests instantiate isolated pools.
//! Health records live behind a single `RwLock`; the lock protects the map
//! structure, not the statistical accuracy of the counters (concurrent
//! requests may interleave increments).

use super::health::KeyHealth;
use super::{ExclusionSet, KeyIndex};
use crate::classify::ErrorKind;
use crate::error::{AppError, AppResult};
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Thresholds governing blacklisting and time-based recovery.
///
/// Defaults match production behavior; tests shrink the durations instead of
/// faking clocks.
#[derive(Debug, Clone)]
pub struct PoolLimits {
    /// Consecutive errors before a key is blacklisted
    pub max_consecutive_errors: u32,
    /// Idle time after which stale error counters decay to zero
    pub error_reset: Duration,
    /// Time a blacklisted key stays excluded from selection
    pub blacklist_duration: Duration,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_consecutive_errors: 3,
            error_reset: Duration::from_secs(5 * 60),
            blacklist_duration: Duration::from_secs(15 * 60),
        }
    }
}

/// Fixed set of configured API keys plus their mutable health records.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<String>,
    limits: PoolLimits,
    health: RwLock<Vec<KeyHealth>>,
}

impl KeyPool {
    /// Build a pool from raw configuration values, filtering out unset or
    /// blank slots.
    ///
    /// Fails with a configuration error if no usable key remains; the server
    /// refuses to start without at least one key.
    pub fn new(raw: impl IntoIterator<Item = Option<String>>) -> AppResult<Self> {
        Self::with_limits(raw, PoolLimits::default())
    }

    /// Like [`KeyPool::new`] with custom thresholds.
    pub fn with_limits(
        raw: impl IntoIterator<Item = Option<String>>,
        limits: PoolLimits,
    ) -> AppResult<Self> {
        let keys: Vec<String> = raw
            .into_iter()
            .flatten()
            .filter(|k| !k.trim().is_empty())
            .collect();

        if keys.is_empty() {
            return Err(AppError::Config(
                "no API keys configured - set at least GEMINI_API_KEY".to_string(),
            ));
        }

        let health = keys.iter().map(|_| KeyHealth::new()).collect();

        tracing::info!(total_keys = keys.len(), "key pool initialized");

        Ok(Self {
            keys,
            limits,
            health: RwLock::new(health),
        })
    }

    /// Number of configured keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: construction rejects empty pools
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The secret for a key. Index validity is guaranteed by construction of
    /// [`KeyIndex`] values through [`KeyPool::select`].
    pub fn secret(&self, index: KeyIndex) -> &str {
        &self.keys[index.0]
    }

    /// Validated handle for the key at position `i` in configuration order.
    pub fn index(&self, i: usize) -> Option<KeyIndex> {
        (i < self.keys.len()).then_some(KeyIndex(i))
    }

    /// Pick the best candidate key for the next attempt.
    ///
    /// Evaluated fresh on every call:
    /// 1. Rehabilitate blacklisted keys whose blacklist window has elapsed.
    /// 2. Decay stale error counters on non-blacklisted keys.
    /// 3. Candidates are all non-blacklisted keys not in `exclude`.
    /// 4. Stable-sort candidates ascending by error count.
    /// 5. Pick uniformly at random from the top half (at least one).
    ///
    /// Returns `None` when every key is blacklisted or excluded. The
    /// randomized top-half pick spreads load over equally healthy keys
    /// instead of converging on a single one.
    pub async fn select(&self, exclude: &ExclusionSet) -> Option<KeyIndex> {
        let now = Instant::now();
        let mut health = self.health.write().await;

        for (i, record) in health.iter_mut().enumerate() {
            if record.refresh(now, &self.limits) {
                tracing::info!(key_index = i, "key removed from blacklist");
            }
        }

        let mut candidates: Vec<(usize, u32)> = health
            .iter()
            .enumerate()
            .filter(|(i, record)| record.is_available() && !exclude.contains(&KeyIndex(*i)))
            .map(|(i, record)| (i, record.error_count()))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        // Stable sort: ties keep configuration order
        candidates.sort_by_key(|(_, error_count)| *error_count);

        let top_half = candidates.len().div_ceil(2);
        let pick = rand::rng().random_range(0..top_half);
        let (index, _) = candidates[pick];

        tracing::debug!(
            key_index = index,
            available = candidates.len(),
            excluded = exclude.len(),
            "selected API key"
        );

        Some(KeyIndex(index))
    }

    /// Number of keys currently eligible for selection (ignoring any
    /// request-scoped exclusions).
    pub async fn available_count(&self) -> usize {
        let health = self.health.read().await;
        health.iter().filter(|r| r.is_available()).count()
    }

    /// Record a failed attempt against a key. Returns true if the key was
    /// newly blacklisted by this failure.
    pub async fn record_failure(&self, index: KeyIndex, kind: ErrorKind) -> bool {
        let mut health = self.health.write().await;
        let record = &mut health[index.0];

        let newly_blacklisted = record.record_failure(Instant::now(), &self.limits);

        if newly_blacklisted {
            tracing::warn!(
                key_index = index.0,
                consecutive_errors = record.consecutive_errors(),
                error_kind = %kind,
                "API key blacklisted after repeated consecutive errors"
            );
        } else {
            tracing::debug!(
                key_index = index.0,
                total_errors = record.error_count(),
                consecutive_errors = record.consecutive_errors(),
                error_kind = %kind,
                "error recorded for key"
            );
        }

        newly_blacklisted
    }

    /// Record a successful attempt: the key's consecutive-error streak ends.
    pub async fn record_success(&self, index: KeyIndex) {
        let mut health = self.health.write().await;
        health[index.0].record_success();
        tracing::debug!(key_index = index.0, "successful request with key");
    }

    /// Snapshot of all health records, in configuration order.
    pub async fn statuses(&self) -> Vec<KeyHealth> {
        self.health.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(n: usize) -> KeyPool {
        KeyPool::new((0..n).map(|i| Some(format!("key-{i}")))).expect("pool should build")
    }

    #[test]
    fn test_empty_pool_fails_construction() {
        let err = KeyPool::new(vec![None, Some("   ".to_string()), None]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_blank_slots_are_filtered() {
        let pool = KeyPool::new(vec![
            Some("alpha".to_string()),
            None,
            Some("".to_string()),
            Some("beta".to_string()),
        ])
        .expect("pool should build");
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.secret(KeyIndex(0)), "alpha");
        assert_eq!(pool.secret(KeyIndex(1)), "beta");
    }

    #[tokio::test]
    async fn test_select_returns_some_for_healthy_pool() {
        let pool = pool_of(4);
        let picked = pool.select(&ExclusionSet::new()).await;
        assert!(picked.is_some());
        assert!(picked.unwrap().get() < 4);
    }

    #[tokio::test]
    async fn test_select_honors_exclusions() {
        let pool = pool_of(3);
        let mut exclude = ExclusionSet::new();
        exclude.insert(KeyIndex(0));
        exclude.insert(KeyIndex(2));

        for _ in 0..20 {
            let picked = pool.select(&exclude).await.expect("one candidate left");
            assert_eq!(picked.get(), 1);
        }
    }

    #[tokio::test]
    async fn test_select_none_when_all_excluded() {
        let pool = pool_of(2);
        let exclude: ExclusionSet = [KeyIndex(0), KeyIndex(1)].into_iter().collect();
        assert!(pool.select(&exclude).await.is_none());
    }

    #[tokio::test]
    async fn test_blacklisted_key_not_selected() {
        let pool = pool_of(2);
        for _ in 0..3 {
            pool.record_failure(KeyIndex(0), ErrorKind::Quota).await;
        }

        for _ in 0..20 {
            let picked = pool.select(&ExclusionSet::new()).await.expect("key 1 healthy");
            assert_eq!(picked.get(), 1);
        }
        assert_eq!(pool.available_count().await, 1);
    }

    #[tokio::test]
    async fn test_all_blacklisted_returns_none() {
        let pool = pool_of(2);
        for i in 0..2 {
            for _ in 0..3 {
                pool.record_failure(KeyIndex(i), ErrorKind::Service).await;
            }
        }
        assert!(pool.select(&ExclusionSet::new()).await.is_none());
        assert_eq!(pool.available_count().await, 0);
    }

    #[tokio::test]
    async fn test_selection_prefers_lower_error_counts() {
        let pool = pool_of(4);
        // Load keys 2 and 3 with errors; healthy half is {0, 1}
        for i in [2usize, 3] {
            pool.record_failure(KeyIndex(i), ErrorKind::RateLimit).await;
            pool.record_success(KeyIndex(i)).await; // avoid blacklisting
            pool.record_failure(KeyIndex(i), ErrorKind::RateLimit).await;
            pool.record_success(KeyIndex(i)).await;
        }

        for _ in 0..50 {
            let picked = pool.select(&ExclusionSet::new()).await.expect("candidates");
            assert!(picked.get() < 2, "picked errored key {}", picked.get());
        }
    }

    #[tokio::test]
    async fn test_single_key_pool_always_selects_it() {
        let pool = pool_of(1);
        let picked = pool.select(&ExclusionSet::new()).await.expect("the only key");
        assert_eq!(picked.get(), 0);
    }

    #[tokio::test]
    async fn test_record_failure_reports_blacklist_transition_once() {
        let pool = pool_of(1);
        assert!(!pool.record_failure(KeyIndex(0), ErrorKind::Quota).await);
        assert!(!pool.record_failure(KeyIndex(0), ErrorKind::Quota).await);
        assert!(pool.record_failure(KeyIndex(0), ErrorKind::Quota).await);
        assert!(!pool.record_failure(KeyIndex(0), ErrorKind::Quota).await);
    }

    #[tokio::test]
    async fn test_statuses_reflect_recorded_state() {
        let pool = pool_of(2);
        pool.record_failure(KeyIndex(1), ErrorKind::Other).await;

        let statuses = pool.statuses().await;
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].error_count(), 0);
        assert_eq!(statuses[1].error_count(), 1);
        assert_eq!(statuses[1].consecutive_errors(), 1);
    }
}
