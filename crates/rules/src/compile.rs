//! Compilation of rule specs into matchable rules.

use crate::error::{RuleError, RuleResult};
use crate::types::{Field, RuleSetSpec, RuleSpec, RuleTarget};
use regex::Regex;
use std::path::Path;

/// A single compiled rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub field: Field,
    pub target: RuleTarget,
    pattern: Regex,
}

impl CompiledRule {
    /// Whether the pattern matches the haystack at all. Used for
    /// `ResourceId` rules, where the value comes from the node text rather
    /// than the match.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }

    /// Extract the rule's value from a text haystack: capture group 1 when
    /// the pattern has one, otherwise the whole match.
    pub fn extract_value(&self, haystack: &str) -> Option<String> {
        let caps = self.pattern.captures(haystack)?;
        let matched = caps.get(1).or_else(|| caps.get(0))?;
        let value = matched.as_str().trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// A compiled rule table, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
    noise_phrases: Vec<String>,
    offer_hints: Vec<String>,
    allowed_packages: Vec<String>,
}

impl CompiledRules {
    /// All rules in priority order.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Rules applicable to accessibility-tree nodes, in priority order.
    pub fn node_rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules
            .iter()
            .filter(|r| matches!(r.target, RuleTarget::ResourceId | RuleTarget::NodeText))
    }

    /// Rules applicable to flattened notification bodies, in priority order.
    pub fn notification_rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules
            .iter()
            .filter(|r| r.target == RuleTarget::Notification)
    }

    /// Whether a flattened (already lowercased) body is status/promo noise.
    pub fn is_noise(&self, body: &str) -> bool {
        self.noise_phrases.iter().any(|p| body.contains(p.as_str()))
    }

    /// Whether a flattened body carries at least one offer hint. An empty
    /// hint list disables the gate.
    pub fn looks_like_offer(&self, body: &str) -> bool {
        self.offer_hints.is_empty() || self.offer_hints.iter().any(|h| body.contains(h.as_str()))
    }

    /// Whether events from `package` should be processed. An empty
    /// allowlist accepts everything.
    pub fn package_allowed(&self, package: &str) -> bool {
        self.allowed_packages.is_empty() || self.allowed_packages.iter().any(|p| p == package)
    }
}

impl RuleSetSpec {
    /// Parse a rule table from a JSON string.
    pub fn from_json_str(json: &str) -> RuleResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a rule table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> RuleResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RuleError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    /// Compile every pattern, preserving table order.
    pub fn compile(self) -> RuleResult<CompiledRules> {
        if self.rules.is_empty() {
            return Err(RuleError::Empty);
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for RuleSpec {
            field,
            target,
            pattern,
        } in self.rules
        {
            let compiled = Regex::new(&pattern).map_err(|e| RuleError::InvalidPattern {
                field,
                pattern: pattern.clone(),
                source: e,
            })?;
            rules.push(CompiledRule {
                field,
                target,
                pattern: compiled,
            });
        }

        tracing::debug!(rules = rules.len(), "rule table compiled");

        Ok(CompiledRules {
            rules,
            // Gating phrases match against pre-lowercased bodies.
            noise_phrases: self.noise_phrases.iter().map(|p| p.to_lowercase()).collect(),
            offer_hints: self.offer_hints.iter().map(|h| h.to_lowercase()).collect(),
            allowed_packages: self.allowed_packages,
        })
    }
}
