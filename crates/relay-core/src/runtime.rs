//! Explicitly constructed provider runtime
//!
//! Owns the registry, selector, classifier metrics, breakers, fallback
//! manager and performance tracker, wired together at one construction
//! point and torn down by an explicit `shutdown`. Callers go through this
//! object instead of process-wide globals.
//!
//! Control flow for a guarded operation: resolve the active provider,
//! consult its breaker, run the call inside a timed scope with timeout
//! and retries, then record the outcome; failures are classified, fed to
//! the breaker, and degraded to a fallback response when the category
//! allows it.

use crate::breaker::{BreakerConfig, BreakerRegistry, BreakerSnapshot};
use crate::classify::{classify, ErrorCategory, ErrorContext, ErrorMonitor, ErrorSummary, FallbackKind};
use crate::config::provider::DEFAULT_TIMEOUT;
use crate::config::ProviderConfig;
use crate::error::{RelayError, RelayResult};
use crate::fallback::cache::{CacheStore, DEFAULT_TTL};
use crate::fallback::{CacheStats, FallbackManager, FallbackStats};
use crate::perf::{PerformanceTracker, SystemSummary};
use crate::provider::selector::SelectorStatus;
use crate::provider::traits::RequestContext;
use crate::provider::{
    GeneratedResponse, HealthReport, IntentAnalysis, ProviderRegistry, ProviderSelector,
};
use crate::recovery::{retry_with_breaker, RetryPolicy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Tuning knobs for [`ProviderRuntime`]
pub struct RuntimeConfig {
    /// One config per candidate provider
    pub providers: Vec<ProviderConfig>,
    /// Pin the active provider by name
    pub explicit_provider: Option<String>,
    /// Retry behavior for provider operations
    pub retry: RetryPolicy,
    /// Default breaker settings applied per provider
    pub breaker: BreakerConfig,
    /// Durable store behind the fallback response cache
    pub cache_store: Option<Arc<dyn CacheStore>>,
    /// Lifetime of cached fallback responses
    pub cache_ttl: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            explicit_provider: None,
            retry: RetryPolicy::default(),
            breaker: BreakerConfig::default(),
            cache_store: None,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

impl RuntimeConfig {
    /// Config with the given provider set
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self {
            providers,
            ..Default::default()
        }
    }

    /// Pin the active provider
    pub fn with_explicit_provider(mut self, name: impl Into<String>) -> Self {
        self.explicit_provider = Some(name.into());
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the breaker defaults
    pub fn with_breaker(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Attach a durable cache store
    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }
}

/// The assembled provider resilience core
pub struct ProviderRuntime {
    registry: Arc<ProviderRegistry>,
    selector: ProviderSelector,
    monitor: ErrorMonitor,
    breakers: BreakerRegistry,
    fallback: FallbackManager,
    tracker: Arc<PerformanceTracker>,
    retry: RetryPolicy,
    configs: Vec<ProviderConfig>,
    cancel: CancellationToken,
}

impl ProviderRuntime {
    /// Single construction point for the core
    pub async fn new(config: RuntimeConfig) -> Self {
        let registry = Arc::new(ProviderRegistry::new());
        let tracker = Arc::new(PerformanceTracker::new());
        let selector = ProviderSelector::new(
            registry.clone(),
            tracker.clone(),
            config.providers.clone(),
            config.explicit_provider.clone(),
        );
        let fallback = match config.cache_store {
            Some(store) => FallbackManager::with_store(store, config.cache_ttl).await,
            None => FallbackManager::new(),
        };

        info!(
            providers = config.providers.len(),
            explicit = ?config.explicit_provider,
            "provider runtime constructed"
        );

        Self {
            registry,
            selector,
            monitor: ErrorMonitor::new(),
            breakers: BreakerRegistry::with_config(config.breaker),
            fallback,
            tracker,
            retry: config.retry,
            configs: config.providers,
            cancel: CancellationToken::new(),
        }
    }

    /// Registry handle, for registering vendor adapter factories
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Eagerly initialize every enabled provider
    pub async fn initialize_all(&self) -> HashMap<String, bool> {
        self.registry.initialize_all(self.configs.clone()).await
    }

    /// Generate text using the active provider, degrading on failure
    ///
    /// Configuration, authentication and model failures surface directly
    /// with their stable error code; every other category degrades to a
    /// successful fallback response carrying the original code.
    pub async fn generate(
        &self,
        prompt: &str,
        context: Option<&RequestContext>,
    ) -> RelayResult<GeneratedResponse> {
        let (max_tokens, temperature) = self.generation_defaults();
        self.generate_with(prompt, context, max_tokens, temperature)
            .await
    }

    /// Generate with explicit sampling parameters
    pub async fn generate_with(
        &self,
        prompt: &str,
        context: Option<&RequestContext>,
        max_tokens: u32,
        temperature: f32,
    ) -> RelayResult<GeneratedResponse> {
        let name = self.selector.resolve().to_string();
        let ctx = ErrorContext::new(name.as_str(), "generate").with_user_input(prompt);
        let timeout = self.timeout_for(&name);
        let breaker = self.breakers.get(&name);

        self.monitor.record_request(&name);
        let mut guard = self.tracker.start_operation(&name, "generate");

        let selector = &self.selector;
        let name_ref = name.as_str();
        let outcome = retry_with_breaker(&self.retry, &breaker, &self.cancel, move |_| async move {
            let provider = selector.active().await?;
            match tokio::time::timeout(
                timeout,
                provider.generate(prompt, context, max_tokens, temperature),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(RelayError::timeout(name_ref, timeout.as_secs())),
            }
        })
        .await;

        match outcome {
            Ok(response) => {
                guard.succeed_with(response.tokens_used, response.model.clone());
                drop(guard);
                self.monitor.record_success(&name);
                breaker.record_success();
                self.remember_good_response(prompt, &response).await;
                Ok(response)
            }
            Err(error) => {
                guard.fail(&error);
                drop(guard);
                self.absorb_failure(&ctx, &error, &breaker);
                self.degrade(prompt, error, &name)
            }
        }
    }

    /// Classify intent using the active provider, degrading to rules
    pub async fn classify_intent(&self, text: &str) -> RelayResult<IntentAnalysis> {
        let name = self.selector.resolve().to_string();
        let ctx = ErrorContext::new(name.as_str(), "classify_intent").with_user_input(text);
        let timeout = self.timeout_for(&name);
        let breaker = self.breakers.get(&name);

        self.monitor.record_request(&name);
        let mut guard = self.tracker.start_operation(&name, "classify_intent");

        let selector = &self.selector;
        let name_ref = name.as_str();
        let outcome = retry_with_breaker(&self.retry, &breaker, &self.cancel, move |_| async move {
            let provider = selector.active().await?;
            match tokio::time::timeout(timeout, provider.classify_intent(text)).await {
                Ok(result) => result,
                Err(_) => Err(RelayError::timeout(name_ref, timeout.as_secs())),
            }
        })
        .await;

        match outcome {
            Ok(analysis) => {
                guard.succeed();
                drop(guard);
                self.monitor.record_success(&name);
                breaker.record_success();
                Ok(analysis)
            }
            Err(error) => {
                guard.fail(&error);
                drop(guard);
                self.absorb_failure(&ctx, &error, &breaker);

                let classification = classify(&error);
                if surfaced_directly(classification.category)
                    || classification.fallback == FallbackKind::None
                {
                    Err(error)
                } else {
                    Ok(self.fallback.analyze_intent(text))
                }
            }
        }
    }

    fn absorb_failure(
        &self,
        ctx: &ErrorContext,
        error: &RelayError,
        breaker: &crate::breaker::CircuitBreaker,
    ) {
        let classification = classify(error);
        self.monitor.record_failure(ctx, error, &classification);
        if classification.category.qualifies_for_breaker() {
            breaker.record_qualifying_failure();
        }
    }

    fn degrade(
        &self,
        prompt: &str,
        error: RelayError,
        provider: &str,
    ) -> RelayResult<GeneratedResponse> {
        let classification = classify(&error);
        if surfaced_directly(classification.category)
            || classification.fallback == FallbackKind::None
        {
            return Err(error);
        }
        Ok(self.fallback.handle_failure(prompt, &error, provider))
    }

    async fn remember_good_response(&self, prompt: &str, response: &GeneratedResponse) {
        if !response.success || response.text.is_empty() {
            return;
        }
        let intent = self.fallback.analyze_intent(prompt).intent;
        if let Err(e) = self
            .fallback
            .remember_response(prompt, &intent, &response.text)
            .await
        {
            tracing::warn!(error = %e, "failed to cache good response");
        }
    }

    fn generation_defaults(&self) -> (u32, f32) {
        let name = self.selector.resolve();
        self.configs
            .iter()
            .find(|c| c.name == name)
            .map(|c| (c.max_tokens, c.temperature))
            .unwrap_or((1000, 0.7))
    }

    fn timeout_for(&self, name: &str) -> Duration {
        self.configs
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.timeout)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Status of the active provider
    pub fn status(&self) -> SelectorStatus {
        self.selector.status()
    }

    /// Health of the active provider (cached within a short window)
    pub async fn health(&self) -> HealthReport {
        self.selector.health().await
    }

    /// System-wide performance summary
    pub fn system_performance(&self) -> SystemSummary {
        self.tracker.system_summary()
    }

    /// Error summary for one provider
    pub fn error_summary(&self, provider: &str) -> ErrorSummary {
        self.monitor.provider_summary(provider)
    }

    /// Error summary across all providers
    pub fn global_error_summary(&self) -> ErrorSummary {
        self.monitor.global_summary()
    }

    /// Breaker snapshots for every provider seen so far
    pub fn breaker_snapshots(&self) -> Vec<(String, BreakerSnapshot)> {
        self.breakers.all_snapshots()
    }

    /// Fallback usage counters
    pub fn fallback_stats(&self) -> FallbackStats {
        self.fallback.stats()
    }

    /// Fallback cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.fallback.cache_stats()
    }

    /// Performance tracker handle
    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    /// Cancel in-flight work and release every provider
    pub async fn shutdown(&self) {
        info!("provider runtime shutting down");
        self.cancel.cancel();

        if let Err(e) = self.fallback.expire_cache().await {
            tracing::warn!(error = %e, "fallback cache expiry on shutdown failed");
        }
        self.registry.shutdown_all().await;
    }
}

/// Categories surfaced to the caller instead of degrading to a fallback
fn surfaced_directly(category: ErrorCategory) -> bool {
    matches!(
        category,
        ErrorCategory::Configuration | ErrorCategory::Authentication | ErrorCategory::Model
    )
}
