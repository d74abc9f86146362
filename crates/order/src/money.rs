//! Fixed-point money amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency amount in minor units (hundredths of the major unit).
///
/// Currency math never goes through floating point; parsing produces minor
/// units directly and everything downstream stays integral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub minor_units: i64,
    /// ISO-style currency code ("USD", "COP", ...).
    pub currency: String,
}

impl Money {
    pub fn new(minor_units: i64, currency: impl Into<String>) -> Self {
        Self {
            minor_units,
            currency: currency.into(),
        }
    }

    /// Whole major units and the remaining minor part.
    pub fn split(&self) -> (i64, i64) {
        (self.minor_units / 100, (self.minor_units % 100).abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = self.split();
        if minor == 0 {
            write!(f, "{} {}", major, self.currency)
        } else {
            write!(f, "{}.{:02} {}", major, minor, self.currency)
        }
    }
}
