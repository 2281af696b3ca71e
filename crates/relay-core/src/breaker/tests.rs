//! Tests for circuit breaker behavior

use std::sync::Arc;
use std::time::Duration;

use super::breaker::CircuitBreaker;
use super::registry::BreakerRegistry;
use super::types::BreakerConfig;

#[test]
fn test_breaker_starts_closed() {
    let breaker = CircuitBreaker::new("gemini");
    assert!(breaker.allow());
    assert!(!breaker.is_open());
}

#[test]
fn test_breaker_opens_at_threshold() {
    let breaker = CircuitBreaker::new("gemini");

    for _ in 0..4 {
        breaker.record_qualifying_failure();
        assert!(breaker.allow());
    }
    breaker.record_qualifying_failure();

    assert!(breaker.is_open());
    assert!(!breaker.allow());
    assert!(!breaker.allow());

    let snapshot = breaker.snapshot();
    assert!(snapshot.open);
    assert_eq!(snapshot.rejected_calls, 2);
}

#[test]
fn test_success_resets_counter_but_not_open_breaker() {
    let config = BreakerConfig::default().with_failure_threshold(3);
    let breaker = CircuitBreaker::with_config("gemini", config);

    breaker.record_qualifying_failure();
    breaker.record_qualifying_failure();
    breaker.record_success();
    assert_eq!(breaker.snapshot().failure_count, 0);

    breaker.record_qualifying_failure();
    breaker.record_qualifying_failure();
    breaker.record_qualifying_failure();
    assert!(breaker.is_open());

    // A success while open must not close the breaker early.
    breaker.record_success();
    assert!(breaker.is_open());
    assert!(!breaker.allow());
}

#[test]
fn test_cooldown_elapse_closes_and_clears_counter() {
    let config = BreakerConfig::default()
        .with_failure_threshold(2)
        .with_cooldown(Duration::from_millis(40));
    let breaker = CircuitBreaker::with_config("gemini", config);

    breaker.record_qualifying_failure();
    breaker.record_qualifying_failure();
    assert!(!breaker.allow());

    std::thread::sleep(Duration::from_millis(50));

    // Cooldown elapsed: the next check closes the breaker and passes.
    assert!(breaker.allow());
    assert!(!breaker.is_open());
    assert_eq!(breaker.snapshot().failure_count, 0);

    // A fresh failure run is needed to open it again.
    breaker.record_qualifying_failure();
    assert!(breaker.allow());
}

#[test]
fn test_trip_and_reset() {
    let breaker = CircuitBreaker::new("gemini");
    breaker.trip();
    assert!(!breaker.allow());

    breaker.reset();
    assert!(breaker.allow());
}

#[test]
fn test_registry_returns_same_instance() {
    let registry = BreakerRegistry::new();
    let a = registry.get("gemini");
    let b = registry.get("openai");
    let a_again = registry.get("gemini");

    assert!(Arc::ptr_eq(&a, &a_again));
    assert!(!Arc::ptr_eq(&a, &b));

    let names = registry.names();
    assert!(names.contains(&"gemini".to_string()));
    assert!(names.contains(&"openai".to_string()));
}

#[tokio::test]
async fn test_concurrent_failures_open_exactly_once() {
    let breaker = Arc::new(CircuitBreaker::new("gemini"));
    let mut handles = Vec::new();

    for _ in 0..10 {
        let breaker = breaker.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                breaker.record_qualifying_failure();
            }
        }));
    }
    for handle in handles {
        handle.await.expect("worker panicked");
    }

    assert!(breaker.is_open());
    assert_eq!(breaker.snapshot().failure_count, 50);
}
