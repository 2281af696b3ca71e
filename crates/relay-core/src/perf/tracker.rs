//! Performance tracker

use super::guard::OperationGuard;
use super::types::{PerformanceMetric, ProviderStats, RecentPerformance, SystemSummary};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Samples kept per provider for windowed summaries
const RECENT_CAPACITY: usize = 100;

struct ProviderRecord {
    stats: ProviderStats,
    recent: VecDeque<PerformanceMetric>,
}

impl ProviderRecord {
    fn new(provider: &str) -> Self {
        Self {
            stats: ProviderStats::new(provider),
            recent: VecDeque::with_capacity(RECENT_CAPACITY),
        }
    }
}

/// Records latency/success samples and serves aggregates
///
/// Updates run under a per-provider lock; the lock is never held across a
/// network call — callers record through [`OperationGuard`] after the
/// operation finishes.
pub struct PerformanceTracker {
    records: DashMap<String, Mutex<ProviderRecord>>,
    started: Mutex<Instant>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            started: Mutex::new(Instant::now()),
        }
    }

    /// Begin a timed operation scope
    ///
    /// The returned guard records exactly one sample when dropped; the
    /// sample counts as a failure unless the guard was marked successful.
    pub fn start_operation(&self, provider: &str, operation: &str) -> OperationGuard<'_> {
        OperationGuard::new(self, provider, operation)
    }

    /// Record one sample
    pub fn record_metric(&self, metric: PerformanceMetric) {
        debug!(
            provider = %metric.provider,
            operation = %metric.operation,
            success = metric.success,
            latency_ms = metric.latency.as_millis() as u64,
            "operation recorded"
        );

        let entry = self
            .records
            .entry(metric.provider.clone())
            .or_insert_with(|| Mutex::new(ProviderRecord::new(&metric.provider)));
        let mut record = entry.lock();

        record.stats.absorb(&metric);
        if record.recent.len() == RECENT_CAPACITY {
            record.recent.pop_front();
        }
        record.recent.push_back(metric);
    }

    /// Running aggregate for one provider
    pub fn provider_stats(&self, provider: &str) -> Option<ProviderStats> {
        self.records
            .get(provider)
            .map(|r| r.lock().stats.clone())
    }

    /// Running aggregates for every provider seen so far
    pub fn all_provider_stats(&self) -> Vec<ProviderStats> {
        self.records
            .iter()
            .map(|entry| entry.value().lock().stats.clone())
            .collect()
    }

    /// Summary over samples recorded within `window` of now
    pub fn recent_performance(&self, provider: &str, window: Duration) -> RecentPerformance {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::zero());

        let mut summary = RecentPerformance {
            provider: provider.to_string(),
            window,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            avg_latency: Duration::ZERO,
            success_rate: 0.0,
            last_request: None,
        };

        let Some(record) = self.records.get(provider) else {
            return summary;
        };
        let record = record.lock();

        let mut latency_sum = Duration::ZERO;
        for metric in record.recent.iter().filter(|m| m.timestamp >= cutoff) {
            summary.total_requests += 1;
            if metric.success {
                summary.successful_requests += 1;
            } else {
                summary.failed_requests += 1;
            }
            latency_sum += metric.latency;
            summary.last_request = Some(
                summary
                    .last_request
                    .map_or(metric.timestamp, |t| t.max(metric.timestamp)),
            );
        }

        if summary.total_requests > 0 {
            summary.avg_latency = latency_sum / summary.total_requests as u32;
            summary.success_rate =
                summary.successful_requests as f64 / summary.total_requests as f64;
        }
        summary
    }

    /// System-wide aggregate across all providers
    pub fn system_summary(&self) -> SystemSummary {
        let all = self.all_provider_stats();

        let total: u64 = all.iter().map(|s| s.total_requests).sum();
        let successful: u64 = all.iter().map(|s| s.successful_requests).sum();
        let failed: u64 = all.iter().map(|s| s.failed_requests).sum();

        let weighted: f64 = all
            .iter()
            .map(|s| s.avg_latency.as_secs_f64() * s.total_requests as f64)
            .sum();
        let avg_latency = if total > 0 {
            Duration::from_secs_f64(weighted / total as f64)
        } else {
            Duration::ZERO
        };

        SystemSummary {
            uptime: self.started.lock().elapsed(),
            total_requests: total,
            successful_requests: successful,
            failed_requests: failed,
            overall_success_rate: if total > 0 {
                successful as f64 / total as f64
            } else {
                0.0
            },
            avg_latency,
            active_providers: all.len(),
            providers: all.into_iter().map(|s| s.provider).collect(),
        }
    }

    /// Drop samples and stats for one provider
    pub fn clear_provider(&self, provider: &str) {
        self.records.remove(provider);
    }

    /// Drop everything and restart the uptime clock
    pub fn clear_all(&self) {
        self.records.clear();
        *self.started.lock() = Instant::now();
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}
