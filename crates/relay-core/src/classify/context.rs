//! Per-operation error context

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Context threaded through classification, logging and metrics
///
/// Created once per logical operation.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Provider the operation targets
    pub provider: String,
    /// Operation name, e.g. `generate` or `health_check`
    pub operation: String,
    /// Original user input, when the operation carries one
    pub user_input: Option<String>,
    /// Request identifier, generated when not supplied
    pub request_id: String,
    /// Session identifier from the caller, when available
    pub session_id: Option<String>,
    /// When the operation started
    pub timestamp: DateTime<Utc>,
    /// Free-form extra context
    pub extra: HashMap<String, serde_json::Value>,
}

impl ErrorContext {
    /// Create a context for one operation, minting a request id
    pub fn new(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            operation: operation.into(),
            user_input: None,
            request_id: Uuid::new_v4().to_string(),
            session_id: None,
            timestamp: Utc::now(),
            extra: HashMap::new(),
        }
    }

    /// Attach the user's input
    pub fn with_user_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = Some(input.into());
        self
    }

    /// Override the generated request id
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Attach a session id
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach an extra context value
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Short preview of the user input for logging (never the full text)
    pub fn input_preview(&self) -> Option<String> {
        self.user_input.as_ref().map(|input| {
            if input.len() > 100 {
                let truncated: String = input.chars().take(100).collect();
                format!("{}...", truncated)
            } else {
                input.clone()
            }
        })
    }
}
