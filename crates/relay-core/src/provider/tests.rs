//! Tests for the mock adapter, registry and selector

use super::mock::MockProvider;
use super::registry::ProviderRegistry;
use super::selector::ProviderSelector;
use super::traits::Provider;
use super::types::{HealthStatus, ProviderStatus};
use crate::config::ProviderConfig;
use crate::error::RelayError;
use crate::perf::PerformanceTracker;
use std::sync::Arc;

fn mock_config(name: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        api_key: Some("test-key".to_string()),
        ..ProviderConfig::default()
    }
}

#[tokio::test]
async fn test_mock_lifecycle() {
    let provider = MockProvider::new(mock_config("mock"));
    assert!(!provider.is_available());
    assert_eq!(provider.status(), ProviderStatus::Unavailable);

    provider.initialize().await.expect("initialize");
    assert!(provider.is_available());

    let response = provider
        .generate("create a task", None, 100, 0.7)
        .await
        .expect("generate");
    assert!(response.success);
    assert_eq!(response.source, "mock");
    assert!(response.tokens_used.unwrap() > 0);

    provider.shutdown().await.expect("shutdown");
    assert!(!provider.is_available());
}

#[tokio::test]
async fn test_mock_rejects_calls_before_initialize() {
    let provider = MockProvider::new(mock_config("mock"));
    let result = provider.generate("hello", None, 100, 0.7).await;
    assert!(matches!(result, Err(RelayError::Unavailable { .. })));
}

#[tokio::test]
async fn test_mock_scripted_failures() {
    let provider = MockProvider::new(mock_config("mock"));
    provider.initialize().await.expect("initialize");
    provider.push_failure(RelayError::network("mock", "connection reset"));

    let first = provider.generate("hello", None, 100, 0.7).await;
    assert!(matches!(first, Err(RelayError::Network { .. })));

    let second = provider.generate("hello", None, 100, 0.7).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_mock_health_check() {
    let provider = MockProvider::new(mock_config("mock"));
    let report = provider.health_check().await.expect("health");
    assert_eq!(report.status, HealthStatus::Unhealthy);

    provider.initialize().await.expect("initialize");
    let report = provider.health_check().await.expect("health");
    assert_eq!(report.status, HealthStatus::Healthy);
    assert!(report.detail.contains_key("model"));
}

#[tokio::test]
async fn test_registry_tolerates_failing_provider() {
    let registry = ProviderRegistry::new();

    // Three enabled configs: "broken" raises during initialize, the
    // other two come up fine.
    registry.register(
        "mock2",
        Arc::new(|config| Arc::new(MockProvider::new(config))),
    );
    registry.register(
        "broken",
        Arc::new(|config| {
            let provider = MockProvider::new(config);
            provider.fail_next_initialize(RelayError::initialization("broken", "handshake failed"));
            Arc::new(provider)
        }),
    );

    let results = registry
        .initialize_all(vec![
            mock_config("mock"),
            mock_config("broken"),
            mock_config("mock2"),
        ])
        .await;

    assert_eq!(results.get("mock"), Some(&true));
    assert_eq!(results.get("mock2"), Some(&true));
    assert_eq!(results.get("broken"), Some(&false));

    assert!(registry.get("mock").is_some());
    assert!(registry.get("broken").is_none());
}

#[tokio::test]
async fn test_registry_unregistered_name_reports_false() {
    let registry = ProviderRegistry::new();

    let results = registry.initialize_all(vec![mock_config("ghost")]).await;
    assert_eq!(results.get("ghost"), Some(&false));
    assert!(registry.get("ghost").is_none());
}

#[tokio::test]
async fn test_registry_get_hides_unavailable_instances() {
    let registry = ProviderRegistry::new();
    registry.initialize_all(vec![mock_config("mock")]).await;

    let provider = registry.get("mock").expect("available");
    provider.shutdown().await.expect("shutdown");

    // Still initialized in the table, but not available: get() hides it.
    assert!(registry.get("mock").is_none());
    assert!(registry.initialized_providers().contains(&"mock".to_string()));
}

#[tokio::test]
async fn test_registry_shutdown_and_reinitialize() {
    let registry = ProviderRegistry::new();
    registry.initialize_all(vec![mock_config("mock")]).await;

    registry.shutdown("mock").await.expect("shutdown");
    assert!(registry.get("mock").is_none());
    assert!(!registry.lifecycle_status("mock").init_ok);

    registry.reinitialize("mock").await.expect("reinitialize");
    assert!(registry.get("mock").is_some());
    assert!(registry.lifecycle_status("mock").init_ok);
}

#[tokio::test]
async fn test_registry_config_rotation() {
    let registry = ProviderRegistry::new();
    registry.initialize_all(vec![mock_config("mock")]).await;

    let mut rotated = mock_config("mock");
    rotated.model = "mock-model-v2".to_string();
    registry.update_config(rotated);
    registry.reinitialize("mock").await.expect("reinitialize");

    let provider = registry.get("mock").expect("available");
    let report = provider.health_check().await.expect("health");
    assert_eq!(
        report.detail.get("model").and_then(|v| v.as_str()),
        Some("mock-model-v2")
    );
}

#[tokio::test]
async fn test_registry_health_sweep() {
    let registry = ProviderRegistry::new();
    registry.initialize_all(vec![mock_config("mock")]).await;

    let reports = registry.health_check_all().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports["mock"].status, HealthStatus::Healthy);
    assert!(registry.lifecycle_status("mock").last_health_check.is_some());
}

#[tokio::test]
async fn test_selector_explicit_resolution() {
    let registry = Arc::new(ProviderRegistry::new());
    let tracker = Arc::new(PerformanceTracker::new());
    let selector = ProviderSelector::new(
        registry,
        tracker,
        vec![mock_config("mock")],
        Some("mock".to_string()),
    );

    assert_eq!(selector.resolve(), "mock");
    let provider = selector.active().await.expect("active provider");
    assert_eq!(provider.name(), "mock");
}

#[tokio::test]
async fn test_selector_credential_detection() {
    let registry = Arc::new(ProviderRegistry::new());
    let tracker = Arc::new(PerformanceTracker::new());

    let gemini = ProviderConfig::new("gemini", "gemini-pro").with_api_key("key-123");
    let selector = ProviderSelector::new(
        registry,
        tracker,
        vec![mock_config("mock"), gemini],
        None,
    );

    // The config holding a credential wins over the keyless mock.
    assert_eq!(selector.resolve(), "gemini");
}

#[tokio::test]
async fn test_selector_defaults_without_credentials() {
    let registry = Arc::new(ProviderRegistry::new());
    let tracker = Arc::new(PerformanceTracker::new());
    let selector = ProviderSelector::new(registry, tracker, vec![mock_config("mock")], None);

    assert_eq!(selector.resolve(), "mock");
}

#[tokio::test]
async fn test_selector_status_and_health_cache() {
    let registry = Arc::new(ProviderRegistry::new());
    let tracker = Arc::new(PerformanceTracker::new());
    let selector = ProviderSelector::new(
        registry,
        tracker.clone(),
        vec![mock_config("mock")],
        Some("mock".to_string()),
    );

    selector.active().await.expect("initialize");

    let status = selector.status();
    assert!(status.available);
    assert!(status.initialized);
    assert_eq!(status.model.as_deref(), Some("mock-model"));
    assert!(status.last_health_check.is_none());

    let report = selector.health().await;
    assert_eq!(report.status, HealthStatus::Healthy);

    // A second health call within the TTL serves the cached report and
    // records no extra health_check sample.
    let samples_after_first = tracker
        .provider_stats("mock")
        .map(|s| s.total_requests)
        .unwrap_or(0);
    let _ = selector.health().await;
    let samples_after_second = tracker
        .provider_stats("mock")
        .map(|s| s.total_requests)
        .unwrap_or(0);
    assert_eq!(samples_after_first, samples_after_second);

    assert!(selector.status().last_health_check.is_some());
}
