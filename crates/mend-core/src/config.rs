//! Configuration types for the OntoMend engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the [`crate::Mend`] facade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MendConfig {
    /// Snapshot store configuration.
    pub store: StoreConfig,

    /// Retry policy for external collaborator calls.
    pub retry: RetryConfig,

    /// Weakening search bounds.
    pub search: SearchConfig,

    /// Decision gate configuration.
    pub gate: GateConfig,
}

/// Snapshot store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the version/audit database.
    pub db_path: PathBuf,

    /// Whether to mirror versions and audit entries to disk. When false
    /// the store is purely in-memory.
    pub persist: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./ontomend.db"),
            persist: false,
        }
    }
}

/// Bounded exponential backoff for transient collaborator failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,

    /// Sleep before the second attempt, in milliseconds.
    pub base_backoff_ms: u64,

    /// Backoff multiplier between consecutive attempts.
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 50,
            multiplier: 2,
        }
    }
}

impl RetryConfig {
    /// Backoff before attempt `attempt` (1-based; attempt 1 never waits).
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.saturating_pow(attempt - 2) as u64;
        Duration::from_millis(self.base_backoff_ms.saturating_mul(factor))
    }
}

/// Weakening search bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of axioms substituted in one repair candidate.
    pub max_combination_size: usize,

    /// Maximum candidates verified per repair call.
    pub max_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_combination_size: 2,
            max_candidates: 256,
        }
    }
}

/// Decision gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// How long a gate may deliberate before the cycle is rejected.
    pub timeout_ms: u64,

    /// Reject candidates whose mean assessment score falls below this,
    /// when set. Only honored by the unattended policy gate.
    pub min_score: Option<f64>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            min_score: None,
        }
    }
}

impl GateConfig {
    /// The gate timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
