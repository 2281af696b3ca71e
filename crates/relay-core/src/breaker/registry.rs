//! Breaker registry keyed by provider name

use std::sync::Arc;

use super::breaker::CircuitBreaker;
use super::types::{BreakerConfig, BreakerSnapshot};

/// Collection of circuit breakers, one per provider
pub struct BreakerRegistry {
    breakers: dashmap::DashMap<String, Arc<CircuitBreaker>>,
    default_config: BreakerConfig,
}

impl BreakerRegistry {
    /// Create a registry with the default breaker config
    pub fn new() -> Self {
        Self::with_config(BreakerConfig::default())
    }

    /// Create a registry with a custom default config
    pub fn with_config(config: BreakerConfig) -> Self {
        Self {
            breakers: dashmap::DashMap::new(),
            default_config: config,
        }
    }

    /// Get or create the breaker for a provider
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::with_config(
                    name,
                    self.default_config.clone(),
                ))
            })
            .clone()
    }

    /// Names of all providers with a breaker
    pub fn names(&self) -> Vec<String> {
        self.breakers.iter().map(|e| e.key().clone()).collect()
    }

    /// Snapshot every breaker
    pub fn all_snapshots(&self) -> Vec<(String, BreakerSnapshot)> {
        self.breakers
            .iter()
            .map(|e| (e.key().clone(), e.value().snapshot()))
            .collect()
    }

    /// Reset every breaker to closed
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
