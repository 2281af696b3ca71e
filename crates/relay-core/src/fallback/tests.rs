//! Tests for intent matching, caching and fallback responses

use super::cache::{JsonFileStore, MemoryStore, ResponseCache};
use super::intent::IntentEngine;
use super::manager::FallbackManager;
use crate::error::RelayError;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_create_task_intent() {
    let engine = IntentEngine::new();
    let analysis = engine.analyze("create a task called review budget");

    assert_eq!(analysis.intent, "create_task");
    assert!(analysis.confidence >= 0.6);
    assert_eq!(analysis.action, "create_task");
    assert_eq!(
        analysis.entities.get("priority").and_then(|v| v.as_str()),
        Some("medium")
    );
}

#[test]
fn test_quoted_name_and_priority_extraction() {
    let engine = IntentEngine::new();
    let analysis = engine.analyze(r#"create an urgent task "fix the build""#);

    assert_eq!(analysis.intent, "create_task");
    assert_eq!(
        analysis.entities.get("task_name").and_then(|v| v.as_str()),
        Some("fix the build")
    );
    assert_eq!(
        analysis.entities.get("priority").and_then(|v| v.as_str()),
        Some("high")
    );
}

#[test]
fn test_unmatched_text_is_general() {
    let engine = IntentEngine::new();
    let analysis = engine.analyze("the weather is nice today");

    assert_eq!(analysis.intent, "general");
    assert!((analysis.confidence - 0.3).abs() < f64::EPSILON);
}

#[test]
fn test_help_intent() {
    let engine = IntentEngine::new();
    let analysis = engine.analyze("help");
    assert_eq!(analysis.intent, "help");
}

#[test]
fn test_response_selection_is_deterministic() {
    let engine = IntentEngine::new();
    let a = engine.response_for("create_task", 0.9, "create a task");
    let b = engine.response_for("create_task", 0.9, "create a task");
    assert_eq!(a, b);
    assert!(!a.is_empty());
}

#[test]
fn test_hedged_band_prefixes_response() {
    let engine = IntentEngine::new();
    let hedged = engine.response_for("create_task", 0.7, "create a task");
    assert!(hedged.starts_with("I think "));
}

#[tokio::test]
async fn test_cache_round_trip_and_expiry() {
    let cache = ResponseCache::with_capacity(16, Duration::from_millis(40));

    cache
        .put("list my tasks", "list_tasks", "here are your tasks")
        .await
        .expect("put");

    assert_eq!(
        cache.get("list my tasks", "list_tasks").as_deref(),
        Some("here are your tasks")
    );
    // Normalization: same text modulo case/whitespace hits the same key.
    assert_eq!(
        cache.get("  List my tasks ", "list_tasks").as_deref(),
        Some("here are your tasks")
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.get("list my tasks", "list_tasks").is_none());

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_cache_warm_start_from_store() {
    let store = Arc::new(MemoryStore::new());

    {
        let cache =
            ResponseCache::with_store(store.clone(), Duration::from_secs(3600)).await;
        cache
            .put("show my projects", "list_projects", "two projects found")
            .await
            .expect("put");
    }

    // A fresh cache over the same store sees the persisted entry.
    let warmed = ResponseCache::with_store(store, Duration::from_secs(3600)).await;
    assert_eq!(
        warmed.get("show my projects", "list_projects").as_deref(),
        Some("two projects found")
    );
}

#[tokio::test]
async fn test_json_file_store_persists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fallback_cache.json");

    {
        let store = Arc::new(JsonFileStore::open(&path).await.expect("open"));
        let cache = ResponseCache::with_store(store.clone(), Duration::from_secs(3600)).await;
        cache
            .put("create a task", "create_task", "task created")
            .await
            .expect("put");
        store.flush().await.expect("flush");
    }

    let store = Arc::new(JsonFileStore::open(&path).await.expect("reopen"));
    let cache = ResponseCache::with_store(store, Duration::from_secs(3600)).await;
    assert_eq!(
        cache.get("create a task", "create_task").as_deref(),
        Some("task created")
    );
}

#[test]
fn test_fallback_is_always_successful() {
    let manager = FallbackManager::new();
    let error = RelayError::authentication("gemini", "invalid key");

    let response = manager.handle_failure("create a task", &error, "gemini");

    assert!(response.success);
    assert_eq!(response.source, "gemini_fallback");
    assert!(response.error.as_deref().unwrap().contains("AUTHENTICATION_ERROR"));
    assert!(!response.text.is_empty());
}

#[test]
fn test_no_provider_rule_based_fallback() {
    let manager = FallbackManager::new();
    let error = RelayError::unavailable("none", "no provider available");

    let response = manager.handle_failure("create a task called review budget", &error, "none");

    assert!(response.success);
    assert_eq!(response.source, "none_fallback");
    assert!(!response.text.is_empty());

    let analysis = manager.analyze_intent("create a task called review budget");
    assert_eq!(analysis.intent, "create_task");
    assert!(analysis.confidence >= 0.6);
}

#[tokio::test]
async fn test_cached_fallback_prefers_remembered_response() {
    let manager = FallbackManager::new();
    manager
        .remember_response("list my tasks", "list_tasks", "you have three tasks")
        .await
        .expect("remember");

    let error = RelayError::rate_limit("gemini", "quota exceeded", Some(30));
    let response = manager.handle_failure("list my tasks", &error, "gemini");

    assert!(response.success);
    assert_eq!(response.text, "you have three tasks");
    assert_eq!(response.source, "gemini_fallback");
}

#[test]
fn test_cached_fallback_miss_degrades_to_rule_based() {
    let manager = FallbackManager::new();
    let error = RelayError::rate_limit("gemini", "quota exceeded", None);

    let response = manager.handle_failure("delete the task", &error, "gemini");

    assert!(response.success);
    assert!(!response.text.is_empty());

    let stats = manager.stats();
    assert_eq!(stats.total_fallbacks, 1);
    assert_eq!(stats.by_kind.get("rule_based"), Some(&1));
}
