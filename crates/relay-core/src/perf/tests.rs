//! Tests for performance tracking

use super::tracker::PerformanceTracker;
use super::types::PerformanceMetric;
use crate::error::RelayError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

fn sample(provider: &str, latency_ms: u64, success: bool) -> PerformanceMetric {
    PerformanceMetric {
        timestamp: Utc::now(),
        provider: provider.to_string(),
        operation: "generate".to_string(),
        latency: Duration::from_millis(latency_ms),
        success,
        error: if success { None } else { Some("boom".to_string()) },
        tokens_used: Some(10),
        model: Some("mock-model".to_string()),
    }
}

#[test]
fn test_running_aggregates() {
    let tracker = PerformanceTracker::new();
    tracker.record_metric(sample("mock", 100, true));
    tracker.record_metric(sample("mock", 300, true));
    tracker.record_metric(sample("mock", 200, false));

    let stats = tracker.provider_stats("mock").expect("stats recorded");
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.successful_requests, 2);
    assert_eq!(stats.failed_requests, 1);
    assert_eq!(stats.min_latency, Duration::from_millis(100));
    assert_eq!(stats.max_latency, Duration::from_millis(300));
    assert!((stats.avg_latency.as_millis() as i64 - 200).abs() <= 1);
    assert_eq!(stats.total_tokens, 30);
    assert!((stats.success_rate() - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.last_error.as_deref(), Some("boom"));
}

#[test]
fn test_guard_records_failure_by_default() {
    let tracker = PerformanceTracker::new();
    {
        let _guard = tracker.start_operation("mock", "generate");
        // Scope exits without marking success.
    }
    let stats = tracker.provider_stats("mock").expect("stats recorded");
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.failed_requests, 1);
}

#[test]
fn test_guard_marks_success_and_tokens() {
    let tracker = PerformanceTracker::new();
    {
        let mut guard = tracker.start_operation("mock", "generate");
        guard.succeed_with(Some(42), Some("mock-model".to_string()));
    }
    let stats = tracker.provider_stats("mock").expect("stats recorded");
    assert_eq!(stats.successful_requests, 1);
    assert_eq!(stats.total_tokens, 42);
}

#[test]
fn test_guard_captures_error_text() {
    let tracker = PerformanceTracker::new();
    {
        let mut guard = tracker.start_operation("mock", "generate");
        guard.fail(&RelayError::network("mock", "connection reset"));
    }
    let stats = tracker.provider_stats("mock").expect("stats recorded");
    assert!(stats.last_error.as_deref().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_guard_records_on_cancellation() {
    let tracker = Arc::new(PerformanceTracker::new());
    let inner = tracker.clone();

    let handle = tokio::spawn(async move {
        let _guard = inner.start_operation("mock", "generate");
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.abort();
    let _ = handle.await;

    let stats = tracker.provider_stats("mock").expect("cancelled op recorded");
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.failed_requests, 1);
}

#[test]
fn test_recent_window_bounded_at_capacity() {
    let tracker = PerformanceTracker::new();
    for i in 0..150 {
        tracker.record_metric(sample("mock", 10, i % 2 == 0));
    }

    let recent = tracker.recent_performance("mock", Duration::from_secs(300));
    assert_eq!(recent.total_requests, 100);
    assert!(recent.last_request.is_some());

    // Lifetime stats still see everything.
    let stats = tracker.provider_stats("mock").expect("stats recorded");
    assert_eq!(stats.total_requests, 150);
}

#[test]
fn test_system_summary_weighted_latency() {
    let tracker = PerformanceTracker::new();
    // Provider a: 1 request at 100ms; provider b: 3 requests at 300ms.
    tracker.record_metric(sample("a", 100, true));
    for _ in 0..3 {
        tracker.record_metric(sample("b", 300, true));
    }

    let summary = tracker.system_summary();
    assert_eq!(summary.total_requests, 4);
    assert_eq!(summary.active_providers, 2);
    assert!((summary.overall_success_rate - 1.0).abs() < f64::EPSILON);
    // Weighted mean: (100*1 + 300*3) / 4 = 250ms.
    assert!((summary.avg_latency.as_millis() as i64 - 250).abs() <= 1);
}

#[tokio::test]
async fn test_concurrent_recording_no_lost_updates() {
    let tracker = Arc::new(PerformanceTracker::new());
    let mut handles = Vec::new();

    for _ in 0..8 {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                tracker.record_metric(sample("mock", 10, i % 2 == 0));
            }
        }));
    }
    for handle in handles {
        handle.await.expect("worker panicked");
    }

    let stats = tracker.provider_stats("mock").expect("stats recorded");
    assert_eq!(stats.total_requests, 400);
    assert_eq!(stats.successful_requests, 200);
    assert!((stats.success_rate() - 0.5).abs() < f64::EPSILON);
}
