//! Rejection reasons for normalization.

use ridelens_rules::Field;
use thiserror::Error;

/// Result type for normalization.
pub type NormalizeResult<T> = Result<T, RejectReason>;

/// Why a field set was rejected instead of becoming an order.
///
/// Rejections are expected, non-fatal outcomes: the pipeline logs them,
/// counts them, and leaves the tracked order untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Fare, or both addresses, were absent.
    #[error("missing required field {field:?}")]
    MissingRequiredField { field: Field },

    /// Fare text did not parse into a fixed-point amount.
    #[error("unparsable amount '{raw}'")]
    UnparsableAmount { raw: String },

    /// Distance text did not parse into meters.
    #[error("unparsable distance '{raw}'")]
    UnparsableDistance { raw: String },
}
