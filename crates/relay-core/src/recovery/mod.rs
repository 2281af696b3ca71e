//! Retry with exponential backoff
//!
//! Transient failures are retried a bounded number of times; the circuit
//! breaker is re-checked before every attempt, not just the first.

pub mod backoff;
pub mod retry;

pub use backoff::BackoffPolicy;
pub use retry::{retry_with_breaker, RetryPolicy};
