//! Advisory accept/reject recommendation for detected orders.
//!
//! Advisory only: the actual decision always comes from the driver through
//! the overlay. The engine logs the recommendation and renderers may show
//! it next to the order.

use crate::record::OrderRecord;
use serde::{Deserialize, Serialize};

/// What the thresholds suggest doing with an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    Accept,
    Reject,
}

/// Profitability thresholds, all in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Operating cost per kilometre driven.
    pub cost_per_km_minor: i64,
    /// Minimum net earnings after the per-km cost.
    pub min_net_minor: i64,
    /// Minimum fare per kilometre.
    pub min_rate_per_km_minor: i64,
    /// Trips shorter than this are not worth the interruption.
    pub min_trip_meters: u64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        // COP-scaled defaults; override per market.
        Self {
            cost_per_km_minor: 50_000,
            min_net_minor: 300_000,
            min_rate_per_km_minor: 100_000,
            min_trip_meters: 1_000,
        }
    }
}

/// A scored recommendation with the dominant reason.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub advice: Advice,
    pub reason: String,
    /// Fare minus per-km operating cost, minor units.
    pub net_minor: i64,
    /// Fare per kilometre, minor units; 0 when the distance is unknown.
    pub rate_per_km_minor: i64,
}

/// Evaluate an order against the thresholds.
///
/// An unknown distance (0 m) fails the trip-length check: without a
/// distance there is no way to price the trip, so the safe advice is
/// Reject and the driver judges from the overlay.
pub fn recommend(record: &OrderRecord, config: &RecommendConfig) -> Recommendation {
    let meters = record.distance_meters;
    let fare = record.fare.minor_units;

    let cost = config.cost_per_km_minor.saturating_mul(meters as i64) / 1_000;
    let net = fare.saturating_sub(cost);
    let rate_per_km = if meters > 0 {
        fare.saturating_mul(1_000) / meters as i64
    } else {
        0
    };

    let trip_ok = meters >= config.min_trip_meters;
    let net_ok = net >= config.min_net_minor;
    let rate_ok = rate_per_km >= config.min_rate_per_km_minor;

    let (advice, reason) = if trip_ok && net_ok && rate_ok {
        (
            Advice::Accept,
            format!(
                "net {} · {}/km over {:.1} km",
                net,
                rate_per_km,
                meters as f64 / 1_000.0
            ),
        )
    } else if !trip_ok {
        (
            Advice::Reject,
            format!("trip too short ({:.1} km)", meters as f64 / 1_000.0),
        )
    } else if !rate_ok {
        (Advice::Reject, format!("rate too low ({}/km)", rate_per_km))
    } else {
        (Advice::Reject, format!("net too low ({})", net))
    };

    Recommendation {
        advice,
        reason,
        net_minor: net,
        rate_per_km_minor: rate_per_km,
    }
}
