//! Deterministic in-process provider
//!
//! Simulates a text-generation backend without any network access. Used
//! as the default offline backend and as the test double for registry,
//! selector and runtime behavior. Failures are injected by scripting an
//! error queue rather than by randomness.

use crate::config::ProviderConfig;
use crate::error::{RelayError, RelayResult};
use crate::fallback::intent::IntentEngine;
use crate::provider::traits::{Provider, RequestContext};
use crate::provider::types::{
    Capabilities, GeneratedResponse, HealthReport, IntentAnalysis, ProviderStatus,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Provider adapter that answers locally
pub struct MockProvider {
    config: ProviderConfig,
    capabilities: Capabilities,
    intent: IntentEngine,
    initialized: AtomicBool,
    status: Mutex<ProviderStatus>,
    request_count: AtomicU64,
    /// Simulated backend latency
    simulate_delay: Duration,
    /// Errors to return, one per call, before resuming normal replies
    scripted_failures: Mutex<VecDeque<RelayError>>,
    /// Fixed reply overriding the generated echo
    canned_reply: Mutex<Option<String>>,
    /// When set, `initialize` fails with this error
    fail_initialize: Mutex<Option<RelayError>>,
}

impl MockProvider {
    /// Create a mock provider from its config
    pub fn new(config: ProviderConfig) -> Self {
        let simulate_delay = config
            .extra_params
            .get("simulate_delay_ms")
            .and_then(|v| v.as_u64())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(1));

        Self {
            capabilities: Capabilities {
                max_tokens: config.max_tokens,
                context_window: Some(8192),
                supports_streaming: false,
                supports_functions: false,
                supports_images: false,
                supports_audio: false,
                cost_per_token: Some(0.0),
                rate_limit_rpm: None,
                rate_limit_tpm: None,
            },
            simulate_delay,
            config,
            intent: IntentEngine::new(),
            initialized: AtomicBool::new(false),
            status: Mutex::new(ProviderStatus::Unavailable),
            request_count: AtomicU64::new(0),
            scripted_failures: Mutex::new(VecDeque::new()),
            canned_reply: Mutex::new(None),
            fail_initialize: Mutex::new(None),
        }
    }

    /// Queue an error to be returned by the next call
    pub fn push_failure(&self, error: RelayError) {
        self.scripted_failures.lock().push_back(error);
    }

    /// Queue the same error for the next `count` calls
    pub fn push_failures(&self, error: RelayError, count: usize) {
        let mut queue = self.scripted_failures.lock();
        for _ in 0..count {
            queue.push_back(error.clone());
        }
    }

    /// Replace generated replies with a fixed one
    pub fn set_canned_reply(&self, reply: impl Into<String>) {
        *self.canned_reply.lock() = Some(reply.into());
    }

    /// Make the next `initialize` call fail
    pub fn fail_next_initialize(&self, error: RelayError) {
        *self.fail_initialize.lock() = Some(error);
    }

    /// Number of calls served (successes and scripted failures)
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    fn take_scripted_failure(&self) -> Option<RelayError> {
        self.scripted_failures.lock().pop_front()
    }

    fn ensure_available(&self) -> RelayResult<()> {
        if !self.is_available() {
            return Err(RelayError::unavailable(
                self.config.name.as_str(),
                "mock provider is not available",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn initialize(&self) -> RelayResult<()> {
        if let Some(error) = self.fail_initialize.lock().take() {
            *self.status.lock() = ProviderStatus::Error;
            return Err(error);
        }

        tokio::time::sleep(self.simulate_delay).await;
        self.initialized.store(true, Ordering::SeqCst);
        *self.status.lock() = ProviderStatus::Available;

        info!(provider = %self.config.name, model = %self.config.model, "mock provider initialized");
        Ok(())
    }

    async fn generate(
        &self,
        prompt: &str,
        _context: Option<&RequestContext>,
        _max_tokens: u32,
        _temperature: f32,
    ) -> RelayResult<GeneratedResponse> {
        self.ensure_available()?;
        self.request_count.fetch_add(1, Ordering::Relaxed);

        tokio::time::sleep(self.simulate_delay).await;

        if let Some(error) = self.take_scripted_failure() {
            debug!(provider = %self.config.name, "returning scripted failure");
            return Err(error);
        }

        let text = self
            .canned_reply
            .lock()
            .clone()
            .unwrap_or_else(|| {
                let analysis = self.intent.analyze(prompt);
                self.intent
                    .response_for(&analysis.intent, analysis.confidence, prompt)
            });
        let tokens = text.split_whitespace().count() as u32;

        Ok(GeneratedResponse::ok(self.config.name.as_str(), text)
            .with_tokens(tokens)
            .with_model(self.config.model.as_str()))
    }

    async fn classify_intent(&self, text: &str) -> RelayResult<IntentAnalysis> {
        self.ensure_available()?;
        self.request_count.fetch_add(1, Ordering::Relaxed);

        if let Some(error) = self.take_scripted_failure() {
            return Err(error);
        }

        Ok(self.intent.analyze(text))
    }

    fn is_available(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
            && *self.status.lock() == ProviderStatus::Available
    }

    fn status(&self) -> ProviderStatus {
        *self.status.lock()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    async fn health_check(&self) -> RelayResult<HealthReport> {
        let start = Instant::now();

        if let Some(error) = self.take_scripted_failure() {
            *self.status.lock() = ProviderStatus::Error;
            return Err(error);
        }

        if !self.is_available() {
            return Ok(HealthReport::unhealthy(
                self.config.name.as_str(),
                "provider not initialized",
            ));
        }

        tokio::time::sleep(self.simulate_delay).await;
        Ok(HealthReport::healthy(self.config.name.as_str(), start.elapsed())
            .with_detail("model", self.config.model.clone().into())
            .with_detail(
                "requests_served",
                self.request_count.load(Ordering::Relaxed).into(),
            ))
    }

    async fn shutdown(&self) -> RelayResult<()> {
        self.initialized.store(false, Ordering::SeqCst);
        *self.status.lock() = ProviderStatus::Unavailable;
        debug!(provider = %self.config.name, "mock provider shut down");
        Ok(())
    }
}
