//! Fallback rule table types

use crate::classify::{ErrorCategory, FallbackKind};
use serde::Serialize;
use std::collections::HashMap;

/// One entry in the ordered fallback rule table
#[derive(Debug, Clone)]
pub struct FallbackRule {
    /// Failure category that activates this rule
    pub trigger: ErrorCategory,
    /// Substitute-response path to take
    pub kind: FallbackKind,
    /// Lower runs first when several rules could apply
    pub priority: u32,
    /// Fixed text for `CannedText` rules
    pub template: Option<String>,
}

impl FallbackRule {
    pub fn new(trigger: ErrorCategory, kind: FallbackKind, priority: u32) -> Self {
        Self {
            trigger,
            kind,
            priority,
            template: None,
        }
    }

    /// Attach the canned template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// Usage counters for the fallback layer
#[derive(Debug, Clone, Default, Serialize)]
pub struct FallbackStats {
    /// Substitute responses produced
    pub total_fallbacks: u64,
    /// Breakdown by the kind that actually answered
    pub by_kind: HashMap<String, u64>,
}

impl FallbackStats {
    pub(crate) fn record(&mut self, kind: FallbackKind) {
        self.total_fallbacks += 1;
        let key = match kind {
            FallbackKind::None => "none",
            FallbackKind::RuleBased => "rule_based",
            FallbackKind::Cached => "cached",
            FallbackKind::AlternativeProvider => "alternative_provider",
            FallbackKind::CannedText => "canned_text",
        };
        *self.by_kind.entry(key.to_string()).or_insert(0) += 1;
    }
}
