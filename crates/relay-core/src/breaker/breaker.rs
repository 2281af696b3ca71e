//! Circuit breaker implementation

use parking_lot::Mutex;
use std::time::Instant;
use tracing::{info, warn};

use super::types::{BreakerConfig, BreakerSnapshot};

#[derive(Debug, Default)]
struct BreakerState {
    open: bool,
    failure_count: u32,
    opened_at: Option<Instant>,
    rejected_calls: u64,
}

/// Breaker guarding one provider
///
/// State transitions: closed -> open when the consecutive qualifying
/// failure count reaches the threshold; open -> closed automatically once
/// the cooldown has elapsed at the next `allow` check, clearing the
/// counter. A success clears the counter but never closes an open breaker
/// before its cooldown.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a breaker with the default config
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, BreakerConfig::default())
    }

    /// Create a breaker with a custom config
    pub fn with_config(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Provider this breaker guards
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a call may proceed right now
    ///
    /// An open breaker whose cooldown has elapsed resets to closed here
    /// and lets the call through.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock();
        if !state.open {
            return true;
        }

        let elapsed = state
            .opened_at
            .map(|at| at.elapsed() >= self.config.cooldown)
            .unwrap_or(true);

        if elapsed {
            state.open = false;
            state.failure_count = 0;
            state.opened_at = None;
            info!(provider = %self.name, "circuit breaker cooldown elapsed, closing");
            return true;
        }

        state.rejected_calls += 1;
        false
    }

    /// Record a breaker-qualifying failure
    ///
    /// Non-qualifying categories (authentication, configuration, model)
    /// must not be recorded here.
    pub fn record_qualifying_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count += 1;

        if !state.open && state.failure_count >= self.config.failure_threshold {
            state.open = true;
            state.opened_at = Some(Instant::now());
            warn!(
                provider = %self.name,
                failures = state.failure_count,
                "circuit breaker opened"
            );
        }
    }

    /// Record a successful call, clearing the consecutive-failure run
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        state.failure_count = 0;
    }

    /// Whether the breaker is open and still inside its cooldown
    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        state.open
            && !state
                .opened_at
                .map(|at| at.elapsed() >= self.config.cooldown)
                .unwrap_or(true)
    }

    /// Force the breaker open
    pub fn trip(&self) {
        let mut state = self.state.lock();
        state.open = true;
        state.opened_at = Some(Instant::now());
        warn!(provider = %self.name, "circuit breaker tripped manually");
    }

    /// Force the breaker closed and clear the counter
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = BreakerState {
            rejected_calls: state.rejected_calls,
            ..BreakerState::default()
        };
        info!(provider = %self.name, "circuit breaker reset");
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.state.lock();
        BreakerSnapshot {
            open: state.open,
            failure_count: state.failure_count,
            opened_at: state.opened_at,
            rejected_calls: state.rejected_calls,
        }
    }
}
