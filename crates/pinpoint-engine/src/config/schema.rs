use super::loader::ConfigError;
use crate::strategy::StrategyKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Strategies to activate. Invocation order is by priority, not list order.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,
    #[serde(default = "default_fuzzy_match_threshold")]
    pub fuzzy_match_threshold: f64,
    /// Extra search passes after the first one fails.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Check that a cached node is still attached before returning it.
    #[serde(default = "default_true")]
    pub verify_cached: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            fuzzy_match_threshold: default_fuzzy_match_threshold(),
            retry_count: default_retry_count(),
            backoff_ms: default_backoff_ms(),
            cache_enabled: true,
            timeout_ms: default_timeout_ms(),
            verify_cached: true,
        }
    }
}

fn default_strategies() -> Vec<StrategyKind> {
    vec![StrategyKind::Structural, StrategyKind::Heuristic]
}

fn default_fuzzy_match_threshold() -> f64 {
    0.8
}

fn default_retry_count() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_true() -> bool {
    true
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.fuzzy_match_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_match_threshold must lie in (0, 1], got {}",
                t
            )));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("at least one strategy is required".into()));
        }
        for (i, kind) in self.strategies.iter().enumerate() {
            if self.strategies[..i].contains(kind) {
                return Err(ConfigError::Invalid(format!(
                    "strategy '{}' listed more than once",
                    kind
                )));
            }
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Per-call overrides of the resolver configuration.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub timeout: Option<Duration>,
    pub retry_count: Option<u32>,
    pub backoff: Option<Duration>,
    /// Skip both cache lookup and cache write.
    pub bypass_cache: bool,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry_count(mut self, retries: u32) -> Self {
        self.retry_count = Some(retries);
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn bypass_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }
}
