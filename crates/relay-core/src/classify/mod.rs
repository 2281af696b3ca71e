//! Failure classification and error accounting
//!
//! Maps every raised failure to a category with severity and a
//! recommended handling strategy, and keeps per-provider plus global
//! error metrics. Classification is a pure function; the monitor holds
//! the mutable counters.

pub mod classifier;
pub mod context;
pub mod metrics;

#[cfg(test)]
mod tests;

pub use classifier::{classify, Classification, ErrorCategory, ErrorSeverity, FallbackKind};
pub use context::ErrorContext;
pub use metrics::{ErrorMetrics, ErrorMonitor, ErrorSummary};
