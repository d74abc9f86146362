//! Canonical order records.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Placeholder for an address the event never carried.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Canonical, normalized view of one observed ride order.
///
/// Invariants: `last_seen_ms >= first_seen_ms`; `fingerprint` is stable
/// across repeated observations of the same real-world order even when the
/// raw text formatting jitters between snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Derived identity key, see the `fingerprint` module.
    pub fingerprint: u64,

    pub fare: Money,

    /// 0 when no distance field was observed.
    pub distance_meters: u64,

    pub pickup: String,
    pub dropoff: String,

    #[serde(default)]
    pub order_id: Option<String>,

    pub first_seen_ms: i64,
    pub last_seen_ms: i64,

    /// Absolute expiry derived from the offer countdown, when present.
    #[serde(default)]
    pub expires_at_ms: Option<i64>,
}

impl OrderRecord {
    /// Whether the fields the overlay actually displays are equal.
    pub fn display_eq(&self, other: &Self) -> bool {
        self.fare == other.fare
            && self.distance_meters == other.distance_meters
            && self.pickup == other.pickup
            && self.dropoff == other.dropoff
            && self.expires_at_ms == other.expires_at_ms
    }

    /// Absorb a repeated observation of the same order (same fingerprint).
    ///
    /// Timestamps advance, a fresher countdown re-arms the expiry, and a
    /// later snapshot may fill in fields the first observation lacked.
    /// Returns whether any displayed field changed.
    pub fn absorb(&mut self, newer: &OrderRecord) -> bool {
        debug_assert_eq!(self.fingerprint, newer.fingerprint);

        let merged = OrderRecord {
            fingerprint: self.fingerprint,
            fare: newer.fare.clone(),
            distance_meters: if newer.distance_meters > 0 {
                newer.distance_meters
            } else {
                self.distance_meters
            },
            pickup: pick_known(&self.pickup, &newer.pickup),
            dropoff: pick_known(&self.dropoff, &newer.dropoff),
            order_id: newer.order_id.clone().or_else(|| self.order_id.clone()),
            first_seen_ms: self.first_seen_ms,
            last_seen_ms: self.last_seen_ms.max(newer.last_seen_ms),
            expires_at_ms: newer.expires_at_ms.or(self.expires_at_ms),
        };

        let display_changed = !self.display_eq(&merged);
        *self = merged;
        display_changed
    }
}

fn pick_known(current: &str, newer: &str) -> String {
    if newer == UNKNOWN_ADDRESS {
        current.to_string()
    } else {
        newer.to_string()
    }
}
