//! Error metrics: per-provider and global accounting

use crate::classify::classifier::Classification;
use crate::classify::context::ErrorContext;
use crate::error::RelayError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, warn};

use super::classifier::ErrorSeverity;

/// Running error counters for one provider (or the whole system)
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorMetrics {
    /// Cumulative classified failures
    pub error_count: u64,
    /// When the most recent failure happened
    pub last_error_time: Option<DateTime<Utc>>,
    /// Failure histogram keyed by stable error code
    pub error_types: HashMap<String, u64>,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// All requests, successful or not
    pub total_requests: u64,
}

impl ErrorMetrics {
    /// Fraction of requests that did not fail; 1.0 before any traffic
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0
        } else {
            let successes = self.total_requests.saturating_sub(self.error_count);
            successes as f64 / self.total_requests as f64
        }
    }

    fn record_request(&mut self) {
        self.total_requests += 1;
    }

    fn record_failure(&mut self, code: &str) {
        self.error_count += 1;
        self.consecutive_failures += 1;
        self.last_error_time = Some(Utc::now());
        *self.error_types.entry(code.to_string()).or_insert(0) += 1;
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }
}

/// Point-in-time error summary for reporting endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    pub provider: String,
    pub error_count: u64,
    pub total_requests: u64,
    pub success_rate: f64,
    pub consecutive_failures: u32,
    pub last_error_time: Option<DateTime<Utc>>,
    pub error_types: HashMap<String, u64>,
}

/// Holder of per-provider and global [`ErrorMetrics`]
///
/// All updates go through a per-provider lock; counters are never touched
/// with an unguarded read-modify-write.
#[derive(Default)]
pub struct ErrorMonitor {
    providers: DashMap<String, Mutex<ErrorMetrics>>,
    global: Mutex<ErrorMetrics>,
}

impl ErrorMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_provider<R>(&self, provider: &str, f: impl FnOnce(&mut ErrorMetrics) -> R) -> R {
        let entry = self
            .providers
            .entry(provider.to_string())
            .or_insert_with(|| Mutex::new(ErrorMetrics::default()));
        let mut metrics = entry.lock();
        f(&mut metrics)
    }

    /// Count one request against a provider and the global totals
    pub fn record_request(&self, provider: &str) {
        self.with_provider(provider, |m| m.record_request());
        self.global.lock().record_request();
    }

    /// Record a classified failure
    ///
    /// Logs at a level matching the severity and updates both the
    /// provider's metrics and the global metrics.
    pub fn record_failure(
        &self,
        context: &ErrorContext,
        err: &RelayError,
        classification: &Classification,
    ) {
        let code = err.error_code();
        self.with_provider(&context.provider, |m| m.record_failure(code));
        self.global.lock().record_failure(code);

        match classification.severity {
            ErrorSeverity::Critical | ErrorSeverity::High => error!(
                provider = %context.provider,
                operation = %context.operation,
                request_id = %context.request_id,
                category = %classification.category,
                code = %code,
                error = %err,
                "provider operation failed"
            ),
            _ => warn!(
                provider = %context.provider,
                operation = %context.operation,
                request_id = %context.request_id,
                category = %classification.category,
                code = %code,
                error = %err,
                "provider operation failed"
            ),
        }
    }

    /// Record a success, resetting the provider's consecutive-failure run
    pub fn record_success(&self, provider: &str) {
        self.with_provider(provider, |m| m.record_success());
    }

    /// Consecutive failures currently recorded for a provider
    pub fn consecutive_failures(&self, provider: &str) -> u32 {
        self.providers
            .get(provider)
            .map(|m| m.lock().consecutive_failures)
            .unwrap_or(0)
    }

    /// Snapshot of one provider's metrics
    pub fn provider_summary(&self, provider: &str) -> ErrorSummary {
        let metrics = self
            .providers
            .get(provider)
            .map(|m| m.lock().clone())
            .unwrap_or_default();
        summarize(provider, &metrics)
    }

    /// Snapshot of the global metrics
    pub fn global_summary(&self) -> ErrorSummary {
        let metrics = self.global.lock().clone();
        summarize("_global", &metrics)
    }

    /// Summaries for every provider seen so far
    pub fn all_summaries(&self) -> Vec<ErrorSummary> {
        self.providers
            .iter()
            .map(|entry| summarize(entry.key(), &entry.value().lock().clone()))
            .collect()
    }

    /// Drop the metrics recorded for one provider
    pub fn reset_provider(&self, provider: &str) {
        self.providers.remove(provider);
    }

    /// Drop everything, including the global totals
    pub fn reset_all(&self) {
        self.providers.clear();
        *self.global.lock() = ErrorMetrics::default();
    }
}

fn summarize(provider: &str, metrics: &ErrorMetrics) -> ErrorSummary {
    ErrorSummary {
        provider: provider.to_string(),
        error_count: metrics.error_count,
        total_requests: metrics.total_requests,
        success_rate: metrics.success_rate(),
        consecutive_failures: metrics.consecutive_failures,
        last_error_time: metrics.last_error_time,
        error_types: metrics.error_types.clone(),
    }
}
