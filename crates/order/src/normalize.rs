//! Normalization of raw field strings into canonical order records.

use crate::error::{NormalizeResult, RejectReason};
use crate::fingerprint;
use crate::money::Money;
use crate::record::{OrderRecord, UNKNOWN_ADDRESS};
use ridelens_extract::FieldSet;
use ridelens_rules::Field;
use serde::{Deserialize, Serialize};

/// Currency handling for fare parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerOptions {
    /// Symbol/code → ISO code, checked in order against the lowercased fare
    /// text; the first hit wins. Longer markers should come before the bare
    /// symbols they contain.
    pub currency_symbols: Vec<(String, String)>,

    /// Currency assumed when the fare text names none.
    pub default_currency: String,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            currency_symbols: [
                ("cop", "COP"),
                ("usd", "USD"),
                ("eur", "EUR"),
                ("$", "USD"),
                ("€", "EUR"),
                ("£", "GBP"),
            ]
            .iter()
            .map(|(s, c)| (s.to_string(), c.to_string()))
            .collect(),
            default_currency: "COP".to_string(),
        }
    }
}

/// Normalize with default options.
pub fn normalize(fields: &FieldSet, source_timestamp_ms: i64) -> NormalizeResult<OrderRecord> {
    normalize_with(fields, source_timestamp_ms, &NormalizerOptions::default())
}

/// Turn extracted raw fields into a canonical record.
///
/// Requires a fare and at least one address; malformed numerics are
/// rejected rather than guessed at. On success the fingerprint is computed
/// and both seen-timestamps are set to the source timestamp.
pub fn normalize_with(
    fields: &FieldSet,
    source_timestamp_ms: i64,
    options: &NormalizerOptions,
) -> NormalizeResult<OrderRecord> {
    let fare_raw = fields
        .get(Field::Fare)
        .ok_or(RejectReason::MissingRequiredField { field: Field::Fare })?;

    let pickup = fields.get(Field::PickupAddress).and_then(clean_address);
    let dropoff = fields.get(Field::DropoffAddress).and_then(clean_address);
    if pickup.is_none() && dropoff.is_none() {
        return Err(RejectReason::MissingRequiredField {
            field: Field::PickupAddress,
        });
    }

    let fare = parse_money(fare_raw, options)?;

    let distance_meters = match fields.get(Field::Distance) {
        Some(raw) => parse_distance(raw)?,
        None => 0,
    };

    let expires_at_ms = fields.get(Field::ExpirySeconds).and_then(|raw| {
        match parse_countdown_seconds(raw) {
            Some(seconds) => Some(source_timestamp_ms + i64::from(seconds) * 1_000),
            None => {
                // A broken countdown is not worth losing the order over.
                tracing::debug!(raw, "ignoring unparsable countdown");
                None
            }
        }
    });

    let pickup = pickup.unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());
    let dropoff = dropoff.unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());
    let fingerprint = fingerprint::fingerprint(&fare, distance_meters, &pickup, &dropoff);

    Ok(OrderRecord {
        fingerprint,
        fare,
        distance_meters,
        pickup,
        dropoff,
        order_id: fields.get(Field::OrderId).map(str::to_string),
        first_seen_ms: source_timestamp_ms,
        last_seen_ms: source_timestamp_ms,
        expires_at_ms,
    })
}

fn clean_address(raw: &str) -> Option<String> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Parse a fare string into fixed-point minor units.
///
/// Handles both separator conventions: `12.50` / `12,50` are decimals,
/// `138.200` / `1,234` are grouped integers, `1,234.56` mixes both.
fn parse_money(raw: &str, options: &NormalizerOptions) -> NormalizeResult<Money> {
    let lower = raw.trim().to_lowercase();

    let currency = options
        .currency_symbols
        .iter()
        .find(|(symbol, _)| lower.contains(symbol.to_lowercase().as_str()))
        .map(|(_, code)| code.clone())
        .unwrap_or_else(|| options.default_currency.clone());

    let numeric = first_numeric_run(&lower);
    let minor_units = parse_decimal_minor(&numeric).ok_or_else(|| RejectReason::UnparsableAmount {
        raw: raw.to_string(),
    })?;

    Ok(Money::new(minor_units, currency))
}

/// First contiguous run of digits and separators, trailing separators
/// trimmed (a fare captured at the end of a sentence keeps its period).
fn first_numeric_run(s: &str) -> String {
    let mut run = String::new();
    let mut started = false;
    for c in s.chars() {
        if c.is_ascii_digit() {
            run.push(c);
            started = true;
        } else if started && (c == '.' || c == ',') {
            run.push(c);
        } else if started {
            break;
        }
    }
    run.trim_end_matches(['.', ',']).to_string()
}

/// Decimal-vs-grouping disambiguation, rejecting anything inconsistent.
fn parse_decimal_minor(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    let dots = s.matches('.').count();
    let commas = s.matches(',').count();

    let (integer_part, fraction_part) = if dots > 0 && commas > 0 {
        // Mixed separators: the one occurring last is the decimal point.
        let decimal_sep = if s.rfind('.') > s.rfind(',') { '.' } else { ',' };
        let group_sep = if decimal_sep == '.' { ',' } else { '.' };
        if s.matches(decimal_sep).count() != 1 {
            return None;
        }
        let (int_raw, frac) = s.split_once(decimal_sep)?;
        (strip_grouping(int_raw, group_sep)?, frac.to_string())
    } else if dots + commas == 0 {
        (s.to_string(), String::new())
    } else {
        let sep = if dots > 0 { '.' } else { ',' };
        if dots + commas == 1 {
            let (int_raw, frac) = s.split_once(sep)?;
            match frac.len() {
                // One or two trailing digits read as a decimal fraction,
                // three as a thousands group (138.200 is COP, not cents).
                1 | 2 => (int_raw.to_string(), frac.to_string()),
                3 => (strip_grouping(s, sep)?, String::new()),
                _ => return None,
            }
        } else {
            (strip_grouping(s, sep)?, String::new())
        }
    };

    if integer_part.is_empty() || !integer_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !fraction_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = integer_part.parse().ok()?;
    let fraction_minor = match fraction_part.len() {
        0 => 0,
        1 => fraction_part.parse::<i64>().ok()? * 10,
        2 => fraction_part.parse::<i64>().ok()?,
        _ => return None,
    };

    whole.checked_mul(100)?.checked_add(fraction_minor)
}

/// Remove a grouping separator, validating group sizes (first group 1-3
/// digits, every later group exactly 3).
fn strip_grouping(s: &str, sep: char) -> Option<String> {
    let groups: Vec<&str> = s.split(sep).collect();
    if groups.is_empty() || groups[0].is_empty() || groups[0].len() > 3 {
        return None;
    }
    for group in &groups[1..] {
        if group.len() != 3 {
            return None;
        }
    }
    Some(groups.concat())
}

/// Parse a distance string into meters, converting unit suffixes.
fn parse_distance(raw: &str) -> NormalizeResult<u64> {
    let reject = || RejectReason::UnparsableDistance {
        raw: raw.to_string(),
    };

    let lower = raw.trim().to_lowercase();
    let split_at = lower
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(lower.len());
    let number_part = lower[..split_at].trim().replace(',', ".");
    let unit_part = lower[split_at..].trim();

    let value: f64 = number_part.parse().map_err(|_| reject())?;
    if !value.is_finite() || value < 0.0 {
        return Err(reject());
    }

    let meters = match unit_part {
        "km" | "kms" | "kilometros" | "kilómetros" => value * 1_000.0,
        "mi" | "mile" | "miles" => value * 1_609.344,
        "" | "m" | "mts" | "metros" => value,
        _ => return Err(reject()),
    };

    Ok(meters.round() as u64)
}

fn parse_countdown_seconds(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let seconds: u32 = digits.parse().ok()?;
    // Offer countdowns are short; hour-plus values are misreads.
    (seconds > 0 && seconds <= 3_600).then_some(seconds)
}
