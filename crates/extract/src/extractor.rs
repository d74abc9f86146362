//! Rule-driven field extraction.

use crate::fieldset::FieldSet;
use ridelens_events::{RawEvent, UiNode};
use ridelens_rules::{CompiledRules, RuleTarget};

/// Applies a compiled rule table to raw events.
///
/// Extraction is total: absent fields are simply unset, never an error.
/// Unrecognized payloads yield an empty `FieldSet`, which the normalizer
/// rejects downstream.
pub struct Extractor {
    rules: CompiledRules,
}

impl Extractor {
    pub fn new(rules: CompiledRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Pure function of the event and the rule table.
    pub fn extract(&self, event: &RawEvent) -> FieldSet {
        match event {
            RawEvent::AccessibilitySnapshot { tree, .. } => self.extract_from_tree(tree),
            RawEvent::NotificationPosted { .. } => self.extract_from_notification(event),
        }
    }

    /// Rule-major walk: rules are tried in table order, and each field takes
    /// the first value any rule finds anywhere in the tree. A high-priority
    /// rule matching a late node beats a low-priority rule matching an early
    /// one.
    fn extract_from_tree(&self, tree: &UiNode) -> FieldSet {
        let mut fields = FieldSet::new();

        for rule in self.rules.node_rules() {
            if fields.contains(rule.field) {
                continue;
            }

            let mut found: Option<String> = None;
            tree.visit(&mut |node| {
                if found.is_some() {
                    return;
                }
                found = match rule.target {
                    RuleTarget::ResourceId => {
                        if !node.resource_id.is_empty() && rule.is_match(&node.resource_id) {
                            let text = node.display_text().trim();
                            (!text.is_empty()).then(|| text.to_string())
                        } else {
                            None
                        }
                    }
                    RuleTarget::NodeText => rule.extract_value(node.display_text()),
                    // node_rules() filters notification rules out.
                    RuleTarget::Notification => None,
                };
            });

            if let Some(value) = found {
                tracing::trace!(field = rule.field.name(), %value, "tree rule fired");
                fields.set_if_absent(rule.field, value);
            }
        }

        fields
    }

    fn extract_from_notification(&self, event: &RawEvent) -> FieldSet {
        let mut fields = FieldSet::new();

        let Some(body) = event.notification_body() else {
            return fields;
        };

        if self.rules.is_noise(&body) {
            tracing::debug!(package = event.package(), "notification dropped as noise");
            return fields;
        }
        if !self.rules.looks_like_offer(&body) {
            tracing::debug!(package = event.package(), "notification carries no offer hint");
            return fields;
        }

        for rule in self.rules.notification_rules() {
            if fields.contains(rule.field) {
                continue;
            }
            if let Some(value) = rule.extract_value(&body) {
                tracing::trace!(field = rule.field.name(), %value, "notification rule fired");
                fields.set_if_absent(rule.field, value);
            }
        }

        fields
    }
}
