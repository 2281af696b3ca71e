//! Fallback manager
//!
//! Produces a best-effort substitute response when the active provider
//! cannot answer. A fallback is never itself a hard failure: the returned
//! response always carries `success = true` with the original error code
//! preserved for observability.

use crate::classify::{classify, ErrorCategory, FallbackKind};
use crate::error::RelayError;
use crate::fallback::cache::{CacheStats, CacheStore, ResponseCache};
use crate::fallback::intent::IntentEngine;
use crate::fallback::types::{FallbackRule, FallbackStats};
use crate::provider::types::{GeneratedResponse, IntentAnalysis};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// The ordered rule table consulted for every classified failure
fn default_rules() -> Vec<FallbackRule> {
    vec![
        FallbackRule::new(ErrorCategory::Authentication, FallbackKind::CannedText, 1)
            .with_template(
                "I'm having authentication trouble with the AI service. Please check the \
                 credentials and try again in a few moments.",
            ),
        FallbackRule::new(ErrorCategory::Configuration, FallbackKind::CannedText, 2)
            .with_template(
                "There's a configuration issue with the AI service. Please review the setup.",
            ),
        FallbackRule::new(ErrorCategory::Model, FallbackKind::CannedText, 3).with_template(
            "There's a problem with the AI model configuration. Please contact support if \
             this persists.",
        ),
        FallbackRule::new(ErrorCategory::Initialization, FallbackKind::CannedText, 4)
            .with_template(
                "The AI service failed to start properly. Please try again after a restart.",
            ),
        FallbackRule::new(ErrorCategory::RateLimit, FallbackKind::Cached, 5),
        FallbackRule::new(ErrorCategory::Network, FallbackKind::Cached, 6),
        FallbackRule::new(ErrorCategory::Server, FallbackKind::Cached, 7),
        FallbackRule::new(ErrorCategory::Unavailable, FallbackKind::RuleBased, 8),
        FallbackRule::new(ErrorCategory::Response, FallbackKind::RuleBased, 9),
    ]
}

/// Substitute-response engine for provider failures
pub struct FallbackManager {
    intent: IntentEngine,
    cache: ResponseCache,
    rules: Vec<FallbackRule>,
    stats: Mutex<FallbackStats>,
}

impl FallbackManager {
    /// Manager with the default rule table and a memory-only cache
    pub fn new() -> Self {
        Self {
            intent: IntentEngine::new(),
            cache: ResponseCache::new(),
            rules: default_rules(),
            stats: Mutex::new(FallbackStats::default()),
        }
    }

    /// Manager whose cache persists through the given store
    pub async fn with_store(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            intent: IntentEngine::new(),
            cache: ResponseCache::with_store(store, ttl).await,
            rules: default_rules(),
            stats: Mutex::new(FallbackStats::default()),
        }
    }

    /// Produce a substitute response for a failed operation
    pub fn handle_failure(
        &self,
        user_input: &str,
        error: &RelayError,
        provider: &str,
    ) -> GeneratedResponse {
        let classification = classify(error);
        let rule = self
            .rules
            .iter()
            .find(|r| r.trigger == classification.category);

        let (kind, text) = match rule {
            Some(rule) => self.execute_rule(rule, user_input),
            // Unknown and anything without a rule degrade to the intent engine.
            None => (
                FallbackKind::RuleBased,
                self.rule_based_response(user_input),
            ),
        };

        self.stats.lock().record(kind);
        warn!(
            provider = %provider,
            category = %classification.category,
            kind = ?kind,
            code = %error.error_code(),
            "serving fallback response"
        );

        GeneratedResponse::fallback(
            provider,
            text,
            format!("fallback used due to: {}", error.error_code()),
        )
    }

    fn execute_rule(&self, rule: &FallbackRule, user_input: &str) -> (FallbackKind, String) {
        match rule.kind {
            FallbackKind::CannedText => {
                let text = rule.template.clone().unwrap_or_else(|| {
                    "I'm experiencing technical difficulties. Please try again later.".to_string()
                });
                (FallbackKind::CannedText, text)
            }
            FallbackKind::Cached => {
                let analysis = self.intent.analyze(user_input);
                match self.cache.get(user_input, &analysis.intent) {
                    Some(text) => (FallbackKind::Cached, text),
                    None => (
                        FallbackKind::RuleBased,
                        self.response_for(&analysis, user_input),
                    ),
                }
            }
            // Provider switching happens above this layer; answer locally.
            FallbackKind::RuleBased | FallbackKind::AlternativeProvider | FallbackKind::None => (
                FallbackKind::RuleBased,
                self.rule_based_response(user_input),
            ),
        }
    }

    fn rule_based_response(&self, user_input: &str) -> String {
        let analysis = self.intent.analyze(user_input);
        self.response_for(&analysis, user_input)
    }

    fn response_for(&self, analysis: &IntentAnalysis, user_input: &str) -> String {
        self.intent
            .response_for(&analysis.intent, analysis.confidence, user_input)
    }

    /// Rule-based intent analysis, usable when no provider can classify
    pub fn analyze_intent(&self, text: &str) -> IntentAnalysis {
        self.intent.analyze(text)
    }

    /// Remember a good live response for future cached fallbacks
    pub async fn remember_response(
        &self,
        user_input: &str,
        intent: &str,
        response: &str,
    ) -> crate::error::RelayResult<()> {
        self.cache.put(user_input, intent, response).await
    }

    /// Cached response for (text, intent), if present and fresh
    pub fn cached_response(&self, text: &str, intent: &str) -> Option<String> {
        self.cache.get(text, intent)
    }

    /// Remove expired entries from the durable store
    pub async fn expire_cache(&self) -> crate::error::RelayResult<usize> {
        self.cache.expire_persisted().await
    }

    /// Usage counters
    pub fn stats(&self) -> FallbackStats {
        self.stats.lock().clone()
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Intents the rule-based engine recognizes
    pub fn supported_intents(&self) -> Vec<&'static str> {
        self.intent.supported_intents()
    }
}

impl Default for FallbackManager {
    fn default() -> Self {
        Self::new()
    }
}
