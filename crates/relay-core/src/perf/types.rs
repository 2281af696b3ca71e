//! Performance sample and aggregate types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// One immutable performance sample
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetric {
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub operation: String,
    #[serde(with = "humantime_serde")]
    pub latency: Duration,
    pub success: bool,
    pub error: Option<String>,
    pub tokens_used: Option<u32>,
    pub model: Option<String>,
}

/// Running aggregate for one provider
///
/// The mean is maintained incrementally, never recomputed from scratch.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub provider: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    #[serde(with = "humantime_serde")]
    pub avg_latency: Duration,
    #[serde(with = "humantime_serde")]
    pub min_latency: Duration,
    #[serde(with = "humantime_serde")]
    pub max_latency: Duration,
    pub total_tokens: u64,
    pub last_request_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub last_error_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ProviderStats {
    pub(crate) fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            avg_latency: Duration::ZERO,
            min_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
            total_tokens: 0,
            last_request_time: None,
            last_success_time: None,
            last_error_time: None,
            last_error: None,
        }
    }

    /// Fold one sample into the running aggregate
    pub(crate) fn absorb(&mut self, metric: &PerformanceMetric) {
        self.total_requests += 1;
        self.last_request_time = Some(metric.timestamp);

        if metric.success {
            self.successful_requests += 1;
            self.last_success_time = Some(metric.timestamp);
        } else {
            self.failed_requests += 1;
            self.last_error_time = Some(metric.timestamp);
            self.last_error = metric.error.clone();
        }

        if self.total_requests == 1 {
            self.min_latency = metric.latency;
            self.max_latency = metric.latency;
            self.avg_latency = metric.latency;
        } else {
            self.min_latency = self.min_latency.min(metric.latency);
            self.max_latency = self.max_latency.max(metric.latency);
            let n = self.total_requests as f64;
            let old = self.avg_latency.as_secs_f64();
            self.avg_latency =
                Duration::from_secs_f64((old * (n - 1.0) + metric.latency.as_secs_f64()) / n);
        }

        if let Some(tokens) = metric.tokens_used {
            self.total_tokens += tokens as u64;
        }
    }

    /// Fraction of requests that succeeded; 0.0 before any traffic
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }
}

/// Summary over the recent-sample window of one provider
#[derive(Debug, Clone, Serialize)]
pub struct RecentPerformance {
    pub provider: String,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    #[serde(with = "humantime_serde")]
    pub avg_latency: Duration,
    pub success_rate: f64,
    pub last_request: Option<DateTime<Utc>>,
}

/// System-wide aggregate across all known providers
#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    #[serde(with = "humantime_serde")]
    pub uptime: Duration,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub overall_success_rate: f64,
    /// Mean latency weighted by each provider's request count
    #[serde(with = "humantime_serde")]
    pub avg_latency: Duration,
    pub active_providers: usize,
    pub providers: Vec<String>,
}
