//! Extraction rule tables.
//!
//! The only thing that needs updating when the observed driver app changes
//! its UI is the rule table: an ordered, externally-loadable list of
//! pattern-to-field mappings, plus the notification gating lists (noise
//! phrases, offer hints) and the package allowlist. This crate owns the
//! serde spec types, regex compilation, and a bundled default table.

mod compile;
mod defaults;
mod error;
mod types;

pub use compile::{CompiledRule, CompiledRules};
pub use error::{RuleError, RuleResult};
pub use types::{Field, RuleSetSpec, RuleSpec, RuleTarget};

/// Compile the bundled default table.
///
/// Infallible by construction: the defaults are covered by tests that
/// compile them, so a failure here is a programming error, not bad user
/// input.
pub fn default_rules() -> CompiledRules {
    match RuleSetSpec::default().compile() {
        Ok(rules) => rules,
        Err(e) => unreachable!("bundled rule table failed to compile: {e}"),
    }
}
