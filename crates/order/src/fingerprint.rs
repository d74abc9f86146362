//! Stable fingerprinting of observed orders.
//!
//! The fingerprint identifies a real-world order across repeated,
//! slightly-varying observations: fare and distance are rounded into
//! buckets and the addresses reduced to normalized prefixes before hashing,
//! so formatting jitter between snapshots does not produce a second
//! "order" while genuinely different offers still hash apart.

use crate::money::Money;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fare jitter absorbed by rounding to the nearest whole major unit.
const FARE_ROUND_MINOR: i64 = 100;
/// Distance jitter absorbed by 500 m buckets.
const DISTANCE_BUCKET_M: u64 = 500;
/// Address prefix length compared after normalization.
const ADDRESS_PREFIX_CHARS: usize = 16;

/// Compute the stable identity key for an observation.
pub fn fingerprint(fare: &Money, distance_meters: u64, pickup: &str, dropoff: &str) -> u64 {
    let rounded_fare = round_to(fare.minor_units, FARE_ROUND_MINOR);
    let distance_bucket = distance_meters / DISTANCE_BUCKET_M;

    let mut hash = FNV_OFFSET;
    hash = fnv_bytes(hash, &rounded_fare.to_le_bytes());
    hash = fnv_bytes(hash, fare.currency.as_bytes());
    hash = fnv_bytes(hash, &distance_bucket.to_le_bytes());
    hash = fnv_bytes(hash, address_key(pickup).as_bytes());
    hash = fnv_bytes(hash, address_key(dropoff).as_bytes());
    hash
}

fn fnv_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    // Field separator keeps ("ab", "c") distinct from ("a", "bc").
    hash ^= 0xff;
    hash.wrapping_mul(FNV_PRIME)
}

fn round_to(value: i64, step: i64) -> i64 {
    ((value + step / 2) / step) * step
}

/// Lowercased, alphanumeric-only, whitespace-collapsed prefix of an address.
fn address_key(address: &str) -> String {
    let normalized: String = address
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    normalized
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(ADDRESS_PREFIX_CHARS)
        .collect()
}
