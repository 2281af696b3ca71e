//! Tests for error classification and metrics

use super::classifier::{classify, ErrorCategory, ErrorSeverity, FallbackKind};
use super::context::ErrorContext;
use super::metrics::ErrorMonitor;
use crate::error::RelayError;
use std::sync::Arc;

#[test]
fn test_authentication_never_retried() {
    let err = RelayError::authentication("gemini", "invalid API key");
    let c = classify(&err);
    assert_eq!(c.category, ErrorCategory::Authentication);
    assert_eq!(c.severity, ErrorSeverity::High);
    assert!(!c.retry_recommended);
    assert_eq!(c.fallback, FallbackKind::RuleBased);
    assert!(!c.category.qualifies_for_breaker());
}

#[test]
fn test_rate_limit_uses_server_delay() {
    let err = RelayError::rate_limit("openai", "quota exceeded", Some(17));
    let c = classify(&err);
    assert_eq!(c.category, ErrorCategory::RateLimit);
    assert!(c.retry_recommended);
    assert_eq!(c.retry_delay.unwrap().as_secs(), 17);
    assert_eq!(c.fallback, FallbackKind::Cached);
    assert!(c.category.qualifies_for_breaker());
}

#[test]
fn test_timeout_is_network_category() {
    let err = RelayError::timeout("gemini", 30);
    let c = classify(&err);
    assert_eq!(c.category, ErrorCategory::Network);
    assert!(c.retry_recommended);
    assert_eq!(c.fallback, FallbackKind::AlternativeProvider);
}

#[test]
fn test_keyword_fallthrough() {
    let err = RelayError::other("503 service temporarily down");
    assert_eq!(classify(&err).category, ErrorCategory::Network);

    let err = RelayError::other("request rejected: unauthorized client");
    assert_eq!(classify(&err).category, ErrorCategory::Authentication);

    let err = RelayError::other("internal server meltdown");
    assert_eq!(classify(&err).category, ErrorCategory::Server);
}

#[test]
fn test_unknown_default() {
    let err = RelayError::other("something inexplicable");
    let c = classify(&err);
    assert_eq!(c.category, ErrorCategory::Unknown);
    assert_eq!(c.severity, ErrorSeverity::Medium);
    assert!(c.retry_recommended);
}

#[test]
fn test_http_status_mapping() {
    let err = RelayError::Http {
        message: "boom".to_string(),
        status_code: Some(429),
    };
    assert_eq!(classify(&err).category, ErrorCategory::RateLimit);

    let err = RelayError::Http {
        message: "boom".to_string(),
        status_code: Some(500),
    };
    assert_eq!(classify(&err).category, ErrorCategory::Server);
}

#[test]
fn test_classification_is_deterministic() {
    let err = RelayError::network("gemini", "connection reset by peer");
    let first = classify(&err);
    let second = classify(&err);
    assert_eq!(first, second);
}

#[test]
fn test_monitor_counts_and_success_rate() {
    let monitor = ErrorMonitor::new();
    let ctx = ErrorContext::new("gemini", "generate");

    for _ in 0..4 {
        monitor.record_request("gemini");
    }
    let err = RelayError::network("gemini", "connection refused");
    let classification = classify(&err);
    monitor.record_failure(&ctx, &err, &classification);

    let summary = monitor.provider_summary("gemini");
    assert_eq!(summary.total_requests, 4);
    assert_eq!(summary.error_count, 1);
    assert!((summary.success_rate - 0.75).abs() < f64::EPSILON);
    assert_eq!(summary.error_types.get("NETWORK_ERROR"), Some(&1));
    assert_eq!(summary.consecutive_failures, 1);

    monitor.record_success("gemini");
    assert_eq!(monitor.consecutive_failures("gemini"), 0);

    let global = monitor.global_summary();
    assert_eq!(global.total_requests, 4);
    assert_eq!(global.error_count, 1);
}

#[tokio::test]
async fn test_monitor_concurrent_updates_lose_nothing() {
    let monitor = Arc::new(ErrorMonitor::new());
    let mut handles = Vec::new();

    for _ in 0..8 {
        let monitor = monitor.clone();
        handles.push(tokio::spawn(async move {
            let ctx = ErrorContext::new("gemini", "generate");
            for i in 0..50 {
                monitor.record_request("gemini");
                if i % 2 == 0 {
                    let err = RelayError::network("gemini", "reset");
                    let c = classify(&err);
                    monitor.record_failure(&ctx, &err, &c);
                } else {
                    monitor.record_success("gemini");
                }
            }
        }));
    }
    for handle in handles {
        handle.await.expect("worker panicked");
    }

    let summary = monitor.provider_summary("gemini");
    assert_eq!(summary.total_requests, 400);
    assert_eq!(summary.error_count, 200);
    assert!((summary.success_rate - 0.5).abs() < f64::EPSILON);
}
