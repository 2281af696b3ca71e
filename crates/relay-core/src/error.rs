//! Error types for the Relay provider core

use thiserror::Error;

/// Result type alias for Relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Main error type for provider operations
///
/// Each variant carries a stable error code (see [`RelayError::error_code`])
/// so callers and the fallback layer can react without string matching.
#[derive(Error, Debug, Clone)]
pub enum RelayError {
    /// Adapter construction or handshake failed
    #[error("Initialization error: {message}")]
    Initialization {
        message: String,
        provider: Option<String>,
    },

    /// Missing or invalid credential/parameter
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        provider: Option<String>,
    },

    /// Credential rejected by the backend
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        provider: Option<String>,
    },

    /// Quota exceeded; `retry_after` is the server-supplied delay in seconds
    #[error("Rate limit error: {message}")]
    RateLimit {
        message: String,
        provider: Option<String>,
        retry_after: Option<u64>,
    },

    /// Connectivity or DNS failure
    #[error("Network error: {message}")]
    Network {
        message: String,
        provider: Option<String>,
    },

    /// Bad request or unsupported model
    #[error("Model error: {message}")]
    Model {
        message: String,
        provider: Option<String>,
        model: Option<String>,
    },

    /// Empty or unparseable backend output
    #[error("Response error: {message}")]
    Response {
        message: String,
        provider: Option<String>,
    },

    /// Provider not initialized or circuit breaker open
    #[error("Provider unavailable: {message}")]
    Unavailable {
        message: String,
        provider: Option<String>,
    },

    /// Operation exceeded its deadline
    #[error("Operation timed out after {seconds} seconds")]
    Timeout {
        seconds: u64,
        provider: Option<String>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// HTTP transport errors from adapter implementations
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        status_code: Option<u16>,
    },

    /// Operation was cancelled by the caller
    #[error("Operation was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl RelayError {
    /// Create a new initialization error
    pub fn initialization(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            provider: None,
        }
    }

    /// Create a new authentication error
    pub fn authentication(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// Create a new rate limit error
    pub fn rate_limit(
        provider: impl Into<String>,
        message: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Self::RateLimit {
            message: message.into(),
            provider: Some(provider.into()),
            retry_after,
        }
    }

    /// Create a new network error
    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// Create a new model error
    pub fn model(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
            provider: Some(provider.into()),
            model: None,
        }
    }

    /// Create a new response error
    pub fn response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Response {
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// Create a new unavailable error
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// Create a new timeout error
    pub fn timeout(provider: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            seconds,
            provider: Some(provider.into()),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Initialization { .. } => "INITIALIZATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::RateLimit { .. } => "RATE_LIMIT_ERROR",
            Self::Network { .. } => "NETWORK_ERROR",
            Self::Model { .. } => "MODEL_ERROR",
            Self::Response { .. } => "RESPONSE_ERROR",
            Self::Unavailable { .. } => "PROVIDER_UNAVAILABLE",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Other(_) => "UNEXPECTED_ERROR",
        }
    }

    /// Provider this error originated from, when known
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Initialization { provider, .. }
            | Self::Configuration { provider, .. }
            | Self::Authentication { provider, .. }
            | Self::RateLimit { provider, .. }
            | Self::Network { provider, .. }
            | Self::Model { provider, .. }
            | Self::Response { provider, .. }
            | Self::Unavailable { provider, .. }
            | Self::Timeout { provider, .. } => provider.as_deref(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<std::io::Error> for RelayError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            return Self::Network {
                message: error.to_string(),
                provider: None,
            };
        }
        Self::Http {
            message: error.to_string(),
            status_code: error.status().map(|s| s.as_u16()),
        }
    }
}
