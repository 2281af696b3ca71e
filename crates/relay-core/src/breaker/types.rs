//! Circuit breaker configuration and snapshots

use std::time::{Duration, Instant};

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive qualifying failures before the breaker opens
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before resetting
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(300),
        }
    }
}

impl BreakerConfig {
    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the cooldown
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

/// Point-in-time view of a breaker's state
#[derive(Debug, Clone)]
pub struct BreakerSnapshot {
    /// Whether the breaker is currently open
    pub open: bool,
    /// Consecutive qualifying failures recorded
    pub failure_count: u32,
    /// When the breaker opened, if it is open
    pub opened_at: Option<Instant>,
    /// Lifetime count of calls rejected while open
    pub rejected_calls: u64,
}
