//! Per-provider circuit breaker
//!
//! Two states only: closed and open. The breaker opens after a threshold
//! of consecutive qualifying failures and resets itself once the cooldown
//! elapses; there is no half-open probe state.

pub mod breaker;
pub mod registry;
pub mod types;

#[cfg(test)]
mod tests;

pub use breaker::CircuitBreaker;
pub use registry::BreakerRegistry;
pub use types::{BreakerConfig, BreakerSnapshot};
