//! Rule table definitions.
//!
//! The table is data, not code: when the observed driver app ships a new UI,
//! the expected maintenance path is editing the rule JSON, never the
//! extraction logic.

use serde::{Deserialize, Serialize};

/// Order fields an extraction rule can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Fare,
    Distance,
    PickupAddress,
    DropoffAddress,
    OrderId,
    ExpirySeconds,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Fare,
        Field::Distance,
        Field::PickupAddress,
        Field::DropoffAddress,
        Field::OrderId,
        Field::ExpirySeconds,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Fare => "fare",
            Field::Distance => "distance",
            Field::PickupAddress => "pickup_address",
            Field::DropoffAddress => "dropoff_address",
            Field::OrderId => "order_id",
            Field::ExpirySeconds => "expiry_seconds",
        }
    }
}

/// What a rule's pattern runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    /// Pattern matches a node's view resource id; the value is that node's
    /// visible text.
    ResourceId,

    /// Pattern matches a node's text or content description; the value is
    /// capture group 1 when the pattern has one, otherwise the whole match.
    NodeText,

    /// Pattern runs over the flattened notification body; same capture
    /// convention as `NodeText`.
    Notification,
}

/// One extraction rule: a pattern-to-field mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub field: Field,
    pub target: RuleTarget,
    pub pattern: String,
}

impl RuleSpec {
    pub fn new(field: Field, target: RuleTarget, pattern: impl Into<String>) -> Self {
        Self {
            field,
            target,
            pattern: pattern.into(),
        }
    }
}

/// Externally-loadable rule table plus notification gating lists.
///
/// Order within `rules` is priority order: the first matching rule per field
/// wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetSpec {
    pub rules: Vec<RuleSpec>,

    /// Notifications containing any of these phrases are status/promo noise
    /// and are dropped before extraction.
    #[serde(default)]
    pub noise_phrases: Vec<String>,

    /// A notification must contain at least one of these to be worth
    /// parsing. Empty list disables the gate.
    #[serde(default)]
    pub offer_hints: Vec<String>,

    /// Driver-app packages we accept events from. Empty list accepts all.
    #[serde(default)]
    pub allowed_packages: Vec<String>,
}
