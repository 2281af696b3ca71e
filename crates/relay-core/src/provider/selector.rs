//! Active-provider selection
//!
//! Resolves which provider serves traffic, initializes it lazily through
//! the registry, and caches its health snapshot so status queries stay
//! cheap.

use crate::config::ProviderConfig;
use crate::error::{RelayError, RelayResult};
use crate::perf::{PerformanceTracker, ProviderStats, RecentPerformance};
use crate::provider::registry::ProviderRegistry;
use crate::provider::traits::Provider;
use crate::provider::types::{Capabilities, HealthReport};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long a cached health report stays fresh
const HEALTH_CACHE_TTL: Duration = Duration::from_secs(30);

/// Fallback provider name when nothing is configured
const DEFAULT_PROVIDER: &str = "mock";

/// Merged view of the active provider for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SelectorStatus {
    pub provider: String,
    pub available: bool,
    pub initialized: bool,
    pub model: Option<String>,
    pub capabilities: Option<Capabilities>,
    pub last_health_check: Option<DateTime<Utc>>,
    pub performance: Option<ProviderStats>,
    pub recent_performance: RecentPerformance,
}

struct CachedHealth {
    report: HealthReport,
    taken_at: Instant,
}

/// Chooses and fronts the single active provider
pub struct ProviderSelector {
    registry: Arc<ProviderRegistry>,
    tracker: Arc<PerformanceTracker>,
    configs: Vec<ProviderConfig>,
    explicit: Option<String>,
    resolved: OnceLock<String>,
    init_attempted: AtomicBool,
    last_health: Mutex<Option<CachedHealth>>,
    health_ttl: Duration,
}

impl ProviderSelector {
    /// Create a selector over the given registry and configs
    ///
    /// `explicit` pins the active provider by name; otherwise the first
    /// enabled config holding a credential wins, then the default.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        tracker: Arc<PerformanceTracker>,
        configs: Vec<ProviderConfig>,
        explicit: Option<String>,
    ) -> Self {
        Self {
            registry,
            tracker,
            configs,
            explicit,
            resolved: OnceLock::new(),
            init_attempted: AtomicBool::new(false),
            last_health: Mutex::new(None),
            health_ttl: HEALTH_CACHE_TTL,
        }
    }

    /// The active provider name; resolution happens once and is cached
    pub fn resolve(&self) -> &str {
        self.resolved.get_or_init(|| {
            if let Some(name) = &self.explicit {
                info!(provider = %name, "provider selected explicitly");
                return name.clone();
            }

            // Detect which credential is actually present.
            for config in &self.configs {
                if config.enabled && config.requires_api_key() && config.has_credential() {
                    info!(provider = %config.name, "provider selected by credential detection");
                    return config.name.clone();
                }
            }

            warn!(
                "no provider selected and no credential found, defaulting to {}",
                DEFAULT_PROVIDER
            );
            DEFAULT_PROVIDER.to_string()
        })
    }

    /// The active provider, initializing it on first use
    ///
    /// Returns an unavailable error when the provider cannot serve; the
    /// caller degrades to the fallback layer.
    pub async fn active(&self) -> RelayResult<Arc<dyn Provider>> {
        let name = self.resolve().to_string();

        if let Some(provider) = self.registry.get(&name) {
            return Ok(provider);
        }

        if !self.init_attempted.swap(true, Ordering::SeqCst) {
            let config = self
                .configs
                .iter()
                .find(|c| c.name == name)
                .cloned()
                .unwrap_or_else(|| ProviderConfig::new(name.clone(), "mock-model"));
            self.registry.initialize_all(vec![config]).await;
        }

        self.registry
            .get(&name)
            .ok_or_else(|| RelayError::unavailable(name.as_str(), "active provider is not available"))
    }

    /// Merged status of the active provider
    ///
    /// Uses the cached health timestamp; run [`ProviderSelector::health`]
    /// for a live check.
    pub fn status(&self) -> SelectorStatus {
        let name = self.resolve().to_string();
        let provider = self.registry.get(&name);
        let lifecycle = self.registry.lifecycle_status(&name);
        let model = self.configs.iter().find(|c| c.name == name).map(|c| c.model.clone());

        let last_health_check = self
            .last_health
            .lock()
            .as_ref()
            .map(|cached| cached.report.timestamp);

        SelectorStatus {
            available: provider.as_ref().map(|p| p.is_available()).unwrap_or(false),
            initialized: lifecycle.initialized,
            capabilities: provider.as_ref().map(|p| p.capabilities()),
            model,
            last_health_check,
            performance: self.tracker.provider_stats(&name),
            recent_performance: self
                .tracker
                .recent_performance(&name, Duration::from_secs(300)),
            provider: name,
        }
    }

    /// Health of the active provider
    ///
    /// Serves the cached report while fresh, otherwise performs a live
    /// check inside a timed metrics scope and caches the result.
    pub async fn health(&self) -> HealthReport {
        if let Some(cached) = self.last_health.lock().as_ref() {
            if cached.taken_at.elapsed() < self.health_ttl {
                return cached.report.clone();
            }
        }
        self.refresh_health().await
    }

    /// Always perform a live health check and update the cache
    pub async fn refresh_health(&self) -> HealthReport {
        let name = self.resolve().to_string();
        let mut guard = self.tracker.start_operation(&name, "health_check");

        let report = match self.active().await {
            Ok(provider) => match provider.health_check().await {
                Ok(report) => {
                    guard.succeed();
                    report
                }
                Err(e) => {
                    guard.fail(&e);
                    HealthReport::unhealthy(name.as_str(), e.to_string())
                }
            },
            Err(e) => {
                guard.fail(&e);
                HealthReport::unhealthy(name.as_str(), e.to_string())
            }
        };
        drop(guard);

        *self.last_health.lock() = Some(CachedHealth {
            report: report.clone(),
            taken_at: Instant::now(),
        });
        report
    }

    /// Shut the active provider down through the registry
    pub async fn shutdown(&self) -> RelayResult<()> {
        let name = self.resolve().to_string();
        self.init_attempted.store(false, Ordering::SeqCst);
        *self.last_health.lock() = None;
        self.registry.shutdown(&name).await
    }
}
