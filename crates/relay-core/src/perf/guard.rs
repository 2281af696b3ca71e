//! RAII scope for timing one provider operation

use super::tracker::PerformanceTracker;
use super::types::PerformanceMetric;
use crate::error::RelayError;
use chrono::Utc;
use std::time::Instant;

/// Timed scope that records exactly one sample when it drops
///
/// The drop runs on every exit path — normal return, error propagation
/// and future cancellation — so latency/failure accounting never skips a
/// call. The sample defaults to failure; call [`OperationGuard::succeed`]
/// (or `succeed_with`) before the scope ends to mark success.
pub struct OperationGuard<'a> {
    tracker: &'a PerformanceTracker,
    provider: String,
    operation: String,
    start: Instant,
    success: bool,
    error: Option<String>,
    tokens_used: Option<u32>,
    model: Option<String>,
}

impl<'a> OperationGuard<'a> {
    pub(super) fn new(tracker: &'a PerformanceTracker, provider: &str, operation: &str) -> Self {
        Self {
            tracker,
            provider: provider.to_string(),
            operation: operation.to_string(),
            start: Instant::now(),
            success: false,
            error: None,
            tokens_used: None,
            model: None,
        }
    }

    /// Mark the operation successful
    pub fn succeed(&mut self) {
        self.success = true;
        self.error = None;
    }

    /// Mark success with token usage and model information
    pub fn succeed_with(&mut self, tokens_used: Option<u32>, model: Option<String>) {
        self.succeed();
        self.tokens_used = tokens_used;
        self.model = model;
    }

    /// Mark failure, attaching the error text
    pub fn fail(&mut self, error: &RelayError) {
        self.success = false;
        self.error = Some(error.to_string());
    }

    /// Elapsed time since the scope opened
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.tracker.record_metric(PerformanceMetric {
            timestamp: Utc::now(),
            provider: std::mem::take(&mut self.provider),
            operation: std::mem::take(&mut self.operation),
            latency: self.start.elapsed(),
            success: self.success,
            error: self.error.take(),
            tokens_used: self.tokens_used,
            model: self.model.take(),
        });
    }
}
