//! API key pool with health-aware selection
//!
//! Owns the fixed list of configured Gemini API keys and their mutable
//! health records. Selection prefers keys with fewer recent errors while
//! randomizing within the healthier half to spread load across concurrent
//! requests.

mod health;
mod pool;

pub use health::KeyHealth;
pub use pool::{KeyPool, PoolLimits};

use std::collections::HashSet;

/// Index of a key in configuration order.
///
/// Keys are identified by position rather than by secret value so that
/// diagnostics and the API response never carry the secret itself.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct KeyIndex(pub(crate) usize);

impl KeyIndex {
    /// Position in configuration order, starting at 0
    pub fn get(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for KeyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keys already tried within a single logical request, excluded from
/// re-selection while untried keys remain.
pub type ExclusionSet = HashSet<KeyIndex>;
