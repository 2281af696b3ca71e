//! The capability contract every backend adapter implements

use crate::error::RelayResult;
use crate::provider::types::{
    Capabilities, GeneratedResponse, HealthReport, IntentAnalysis, ProviderStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Free-form context passed alongside a generation request
pub type RequestContext = HashMap<String, serde_json::Value>;

/// Uniform contract for swappable text-generation backends
///
/// `initialize`, `generate`, `classify_intent` and `health_check` are the
/// only suspension points; callers wrap them in a timeout derived from the
/// provider's config. `is_available` must be true only after a successful
/// `initialize` and while the adapter's own health flag is available —
/// it is the single gate the selector and circuit breaker consult.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, stable across the process lifetime
    fn name(&self) -> &str;

    /// Initialize the adapter (handshake, credential validation)
    async fn initialize(&self) -> RelayResult<()>;

    /// Generate text for a prompt
    async fn generate(
        &self,
        prompt: &str,
        context: Option<&RequestContext>,
        max_tokens: u32,
        temperature: f32,
    ) -> RelayResult<GeneratedResponse>;

    /// Classify the intent of a user's text
    async fn classify_intent(&self, text: &str) -> RelayResult<IntentAnalysis>;

    /// Whether the adapter is initialized and healthy
    fn is_available(&self) -> bool;

    /// Current health flag
    fn status(&self) -> ProviderStatus;

    /// Static capability descriptor
    fn capabilities(&self) -> Capabilities;

    /// Live health check against the backend
    async fn health_check(&self) -> RelayResult<HealthReport>;

    /// Release held resources; the adapter is unavailable afterwards
    async fn shutdown(&self) -> RelayResult<()>;
}
