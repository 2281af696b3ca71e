//! Error classification

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure category derived from an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Server,
    Model,
    Configuration,
    Initialization,
    Response,
    Unavailable,
    Unknown,
}

impl ErrorCategory {
    /// Whether failures of this category count toward the circuit breaker
    ///
    /// Only transient backend trouble qualifies; caller-side mistakes
    /// (auth, config, model) never trip the breaker.
    pub fn qualifies_for_breaker(&self) -> bool {
        matches!(self, Self::Network | Self::Server | Self::RateLimit)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authentication => "authentication",
            Self::RateLimit => "rate_limit",
            Self::Network => "network",
            Self::Server => "server",
            Self::Model => "model",
            Self::Configuration => "configuration",
            Self::Initialization => "initialization",
            Self::Response => "response",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Severity levels for logging and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Which substitute-response path to take after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// No fallback; surface the error
    None,
    /// Intent-matched canned response
    RuleBased,
    /// Previously generated good response from the cache
    Cached,
    /// Try a different provider
    AlternativeProvider,
    /// Fixed explanatory text
    CannedText,
}

/// Outcome of classifying one failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub retry_recommended: bool,
    /// Suggested wait before retrying, when a retry is recommended
    pub retry_delay: Option<Duration>,
    pub fallback: FallbackKind,
}

impl Classification {
    fn new(
        category: ErrorCategory,
        severity: ErrorSeverity,
        retry_recommended: bool,
        retry_delay: Option<Duration>,
        fallback: FallbackKind,
    ) -> Self {
        Self {
            category,
            severity,
            retry_recommended,
            retry_delay,
            fallback,
        }
    }
}

/// Keyword table for errors that carry no typed category, checked in order
const KEYWORD_PATTERNS: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::Authentication,
        &["auth", "unauthorized", "invalid key", "forbidden", "401", "403"],
    ),
    (
        ErrorCategory::RateLimit,
        &["rate limit", "quota", "429", "too many requests"],
    ),
    (
        ErrorCategory::Network,
        &["connection", "timeout", "network", "dns", "502", "503", "504"],
    ),
    (
        ErrorCategory::Model,
        &["model", "invalid request", "bad request", "400"],
    ),
    (ErrorCategory::Server, &["internal server", "500"]),
];

fn for_category(category: ErrorCategory, retry_after: Option<u64>) -> Classification {
    use ErrorCategory::*;
    match category {
        Authentication => Classification::new(
            Authentication,
            ErrorSeverity::High,
            false,
            None,
            FallbackKind::RuleBased,
        ),
        RateLimit => Classification::new(
            RateLimit,
            ErrorSeverity::Medium,
            true,
            Some(Duration::from_secs(retry_after.unwrap_or(60))),
            FallbackKind::Cached,
        ),
        Network => Classification::new(
            Network,
            ErrorSeverity::Medium,
            true,
            Some(Duration::from_secs(5)),
            FallbackKind::AlternativeProvider,
        ),
        Server => Classification::new(
            Server,
            ErrorSeverity::High,
            true,
            Some(Duration::from_secs(30)),
            FallbackKind::AlternativeProvider,
        ),
        Model => Classification::new(
            Model,
            ErrorSeverity::High,
            false,
            None,
            FallbackKind::RuleBased,
        ),
        Configuration => Classification::new(
            Configuration,
            ErrorSeverity::Critical,
            false,
            None,
            FallbackKind::RuleBased,
        ),
        Initialization => Classification::new(
            Initialization,
            ErrorSeverity::Critical,
            false,
            None,
            FallbackKind::RuleBased,
        ),
        Response => Classification::new(
            Response,
            ErrorSeverity::Medium,
            true,
            Some(Duration::from_secs(1)),
            FallbackKind::RuleBased,
        ),
        Unavailable => Classification::new(
            Unavailable,
            ErrorSeverity::Medium,
            false,
            None,
            FallbackKind::RuleBased,
        ),
        Unknown => Classification::new(
            Unknown,
            ErrorSeverity::Medium,
            true,
            Some(Duration::from_secs(5)),
            FallbackKind::RuleBased,
        ),
    }
}

/// Classify a failure into category, severity and handling strategy
///
/// Total and deterministic: typed errors map directly, untyped errors
/// fall back to keyword matching against the message, and anything left
/// is `unknown` with a retry recommended.
pub fn classify(error: &RelayError) -> Classification {
    match error {
        RelayError::Authentication { .. } => for_category(ErrorCategory::Authentication, None),
        RelayError::RateLimit { retry_after, .. } => {
            for_category(ErrorCategory::RateLimit, *retry_after)
        }
        // Timeouts are network trouble by definition.
        RelayError::Network { .. } | RelayError::Timeout { .. } => {
            for_category(ErrorCategory::Network, None)
        }
        RelayError::Model { .. } => for_category(ErrorCategory::Model, None),
        RelayError::Configuration { .. } => for_category(ErrorCategory::Configuration, None),
        RelayError::Initialization { .. } => for_category(ErrorCategory::Initialization, None),
        RelayError::Response { .. } => for_category(ErrorCategory::Response, None),
        RelayError::Unavailable { .. } => for_category(ErrorCategory::Unavailable, None),
        RelayError::Http {
            status_code: Some(code),
            ..
        } => for_category(category_for_status(*code), None),
        RelayError::Cancelled => Classification::new(
            ErrorCategory::Unknown,
            ErrorSeverity::Low,
            false,
            None,
            FallbackKind::None,
        ),
        RelayError::Http { message, .. }
        | RelayError::Io(message)
        | RelayError::Json(message)
        | RelayError::Other(message) => classify_by_keywords(message),
    }
}

fn category_for_status(code: u16) -> ErrorCategory {
    match code {
        401 | 403 => ErrorCategory::Authentication,
        429 => ErrorCategory::RateLimit,
        400 | 404 | 422 => ErrorCategory::Model,
        502 | 503 | 504 => ErrorCategory::Network,
        500..=599 => ErrorCategory::Server,
        _ => ErrorCategory::Unknown,
    }
}

fn classify_by_keywords(message: &str) -> Classification {
    let lower = message.to_lowercase();
    for (category, keywords) in KEYWORD_PATTERNS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return for_category(*category, None);
        }
    }
    for_category(ErrorCategory::Unknown, None)
}
