//! Per-provider configuration

use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default request timeout applied when a config does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a single backend provider
///
/// Immutable once built; constructed by the external configuration
/// loader and passed into the registry at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (e.g. "gemini", "openai", "mock")
    pub name: String,
    /// Whether this provider participates in initialization
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// API credential, if the provider requires one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier to request from the backend
    pub model: String,
    /// Endpoint override (self-hosted or proxy deployments)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling temperature (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens per generated response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout for network-bound provider operations
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    /// Vendor-specific parameters passed through opaquely
    #[serde(default)]
    pub extra_params: HashMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            enabled: true,
            api_key: None,
            model: "mock-model".to_string(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout: DEFAULT_TIMEOUT,
            extra_params: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the API credential
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the endpoint override
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set maximum response tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable this provider
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Add a vendor-specific parameter
    pub fn with_extra_param(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.extra_params.insert(key.into(), value);
        self
    }

    /// Whether this provider needs a credential to operate
    ///
    /// Local and deterministic backends run without one.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self.name.as_str(), "ollama" | "mock")
    }

    /// Whether a usable credential is present
    pub fn has_credential(&self) -> bool {
        !self.requires_api_key()
            || self
                .api_key
                .as_deref()
                .map(|k| !k.is_empty())
                .unwrap_or(false)
    }

    /// Validate the config before initialization
    pub fn validate(&self) -> RelayResult<()> {
        if self.name.is_empty() {
            return Err(RelayError::configuration("provider name is empty"));
        }
        if self.model.is_empty() {
            return Err(RelayError::Configuration {
                message: "model identifier is empty".to_string(),
                provider: Some(self.name.clone()),
            });
        }
        if self.enabled && !self.has_credential() {
            return Err(RelayError::Configuration {
                message: format!("provider '{}' requires an API key", self.name),
                provider: Some(self.name.clone()),
            });
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(RelayError::Configuration {
                message: format!("temperature {} outside [0.0, 1.0]", self.temperature),
                provider: Some(self.name.clone()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ProviderConfig::new("gemini", "gemini-pro")
            .with_api_key("key-123")
            .with_temperature(0.3)
            .with_max_tokens(2048)
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.name, "gemini");
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.max_tokens, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credential_rejected() {
        let config = ProviderConfig::new("openai", "gpt-4o");
        assert!(!config.has_credential());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mock_needs_no_credential() {
        let config = ProviderConfig::new("mock", "mock-model");
        assert!(config.has_credential());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_temperature_bounds() {
        let config = ProviderConfig::new("mock", "mock-model").with_temperature(1.5);
        assert!(config.validate().is_err());
    }
}
