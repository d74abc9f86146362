//! Error types for rule loading and compilation.

use crate::types::Field;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;

/// Errors that can occur while loading or compiling a rule table.
///
/// These surface once, at configuration time, before the pipeline starts;
/// the running pipeline itself never fails on rule matching.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Failed to read a rule file.
    #[error("failed to read rule file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rule table is not valid JSON.
    #[error("invalid rule JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A rule pattern failed to compile.
    #[error("invalid pattern '{pattern}' for field {field:?}: {source}")]
    InvalidPattern {
        field: Field,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The table contains no rules at all.
    #[error("rule table has no rules")]
    Empty,
}
