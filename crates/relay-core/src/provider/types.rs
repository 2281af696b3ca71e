//! Provider data model: responses, capabilities, health

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Provider availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Ready to serve requests
    Available,
    /// Not initialized or shut down
    Unavailable,
    /// Last operation failed
    Error,
    /// Backend is throttling requests
    RateLimited,
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Error => write!(f, "error"),
            Self::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Uniform response produced by every provider call and by the fallback layer
///
/// A live answer and a locally computed substitute are distinguished only
/// by `source`: fallbacks carry `"<provider>_fallback"` and keep the
/// original error code in `error` for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedResponse {
    /// Whether the caller received usable text
    pub success: bool,
    /// The generated (or substituted) text
    pub text: String,
    /// Originating provider name, or `"<provider>_fallback"`
    pub source: String,
    /// Tokens consumed, when the backend reports them
    pub tokens_used: Option<u32>,
    /// Model that produced the text
    pub model: Option<String>,
    /// Error code/message attached for diagnostics
    pub error: Option<String>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl GeneratedResponse {
    /// Successful live response from a provider
    pub fn ok(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            source: source.into(),
            tokens_used: None,
            model: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Failed response carrying the error code and a short apology text
    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            text: format!("I apologize, but I encountered an error: {}", error),
            source: source.into(),
            tokens_used: None,
            model: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    /// Substitute response produced by the fallback layer
    ///
    /// Fallbacks are successful by contract; the triggering error code is
    /// preserved in `error`.
    pub fn fallback(
        provider: &str,
        text: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            text: text.into(),
            source: format!("{}_fallback", provider),
            tokens_used: None,
            model: None,
            error: Some(cause.into()),
            timestamp: Utc::now(),
        }
    }

    /// Attach token usage
    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens_used = Some(tokens);
        self
    }

    /// Attach the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Whether this response came from the fallback layer
    pub fn is_fallback(&self) -> bool {
        self.source.ends_with("_fallback")
    }
}

/// Static per-provider capability descriptor, set at adapter construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Maximum tokens per response
    pub max_tokens: u32,
    /// Context window size, when published by the vendor
    pub context_window: Option<u32>,
    /// Streaming response support
    pub supports_streaming: bool,
    /// Function/tool calling support
    pub supports_functions: bool,
    /// Image input support
    pub supports_images: bool,
    /// Audio input support
    pub supports_audio: bool,
    /// Approximate cost per token in USD
    pub cost_per_token: Option<f64>,
    /// Requests-per-minute hint
    pub rate_limit_rpm: Option<u32>,
    /// Tokens-per-minute hint
    pub rate_limit_tpm: Option<u32>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            context_window: None,
            supports_streaming: false,
            supports_functions: false,
            supports_images: false,
            supports_audio: false,
            cost_per_token: None,
            rate_limit_rpm: None,
            rate_limit_tpm: None,
        }
    }
}

/// Result of classifying a user's text into an actionable intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentAnalysis {
    /// Intent label, e.g. `create_task`
    pub intent: String,
    /// Confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Extracted entities (names, priorities, ...)
    pub entities: HashMap<String, serde_json::Value>,
    /// Downstream action the intent maps to
    pub action: String,
}

impl IntentAnalysis {
    /// Catch-all analysis used when nothing matches
    pub fn general() -> Self {
        Self {
            intent: "general".to_string(),
            confidence: 0.3,
            entities: HashMap::new(),
            action: "general_response".to_string(),
        }
    }
}

/// Health verdict from a live provider check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Outcome of a provider health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall verdict
    pub status: HealthStatus,
    /// Provider that was checked
    pub provider: String,
    /// Round-trip latency of the check
    #[serde(with = "humantime_serde")]
    pub latency: Duration,
    /// Free-form diagnostic details
    pub detail: HashMap<String, serde_json::Value>,
    /// Error text when unhealthy
    pub error: Option<String>,
    /// When the check ran
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Healthy report with the measured latency
    pub fn healthy(provider: impl Into<String>, latency: Duration) -> Self {
        Self {
            status: HealthStatus::Healthy,
            provider: provider.into(),
            latency,
            detail: HashMap::new(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Unhealthy report carrying the failure text
    pub fn unhealthy(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            provider: provider.into(),
            latency: Duration::ZERO,
            detail: HashMap::new(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a diagnostic detail
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.detail.insert(key.into(), value);
        self
    }
}
