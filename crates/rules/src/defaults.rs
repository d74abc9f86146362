//! Bundled default rule table for the currently-observed driver app.
//!
//! Patterns, gating phrases and package names cover the DiDi driver builds
//! the overlay ships against today (Spanish-locale Latin American markets).
//! Deployments override any of this through `RuleSetSpec::from_path`.

use crate::types::{Field, RuleSpec, RuleSetSpec, RuleTarget};

fn rule(field: Field, target: RuleTarget, pattern: &str) -> RuleSpec {
    RuleSpec::new(field, target, pattern)
}

impl Default for RuleSetSpec {
    fn default() -> Self {
        Self {
            rules: vec![
                // Fare: explicit resource ids beat text scraping; the bare
                // long-digit fallback catches COP fares rendered without a
                // currency marker.
                rule(Field::Fare, RuleTarget::ResourceId, r"(?i):id/(?:fare|price|amount)"),
                rule(
                    Field::Fare,
                    RuleTarget::NodeText,
                    r"(?i)(?:cop|usd|\$|€)\s*([0-9][0-9.,]*)",
                ),
                rule(
                    Field::Fare,
                    RuleTarget::Notification,
                    r"(?i)(?:cop|usd|\$|€)\s*([0-9][0-9.,]*)",
                ),
                rule(Field::Fare, RuleTarget::Notification, r"(?:^|\D)(\d{5,})(?:\D|$)"),
                // Distance: keep the unit suffix in the captured value, the
                // normalizer needs it for conversion.
                rule(Field::Distance, RuleTarget::ResourceId, r"(?i):id/(?:distance|trip)"),
                rule(
                    Field::Distance,
                    RuleTarget::NodeText,
                    r"(?i)(\d+(?:[.,]\d+)?\s*(?:km|mi|m)\b)",
                ),
                rule(
                    Field::Distance,
                    RuleTarget::Notification,
                    r"(?i)(\d+(?:[.,]\d+)?\s*(?:km|mi)\b)",
                ),
                // Pickup address.
                rule(
                    Field::PickupAddress,
                    RuleTarget::ResourceId,
                    r"(?i):id/(?:pickup|origin|start)(?:_addr(?:ess)?|_text)?$",
                ),
                rule(
                    Field::PickupAddress,
                    RuleTarget::NodeText,
                    r"(?i)(?:recogida|pickup|desde)\s*[:·]?\s+(\S.{2,79})",
                ),
                rule(
                    Field::PickupAddress,
                    RuleTarget::Notification,
                    r"(?i)(?:recogida|pickup)\s*[:·]?\s+([^·|]{3,80})",
                ),
                // Dropoff address.
                rule(
                    Field::DropoffAddress,
                    RuleTarget::ResourceId,
                    r"(?i):id/(?:dropoff|dest(?:ination)?|end)(?:_addr(?:ess)?|_text)?$",
                ),
                rule(
                    Field::DropoffAddress,
                    RuleTarget::NodeText,
                    r"(?i)(?:destino|dropoff|hacia|hasta)\s*[:·]?\s+(\S.{2,79})",
                ),
                rule(
                    Field::DropoffAddress,
                    RuleTarget::Notification,
                    r"(?i)(?:destino|dropoff)\s*[:·]?\s+([^·|]{3,80})",
                ),
                // Order id, when the app exposes one.
                rule(Field::OrderId, RuleTarget::ResourceId, r"(?i):id/order_?id"),
                rule(
                    Field::OrderId,
                    RuleTarget::Notification,
                    r"(?i)(?:orden|order)\s*#?\s*([a-z0-9][a-z0-9-]{5,})",
                ),
                // Countdown until the offer disappears.
                rule(
                    Field::ExpirySeconds,
                    RuleTarget::ResourceId,
                    r"(?i):id/(?:count_?down|timer)",
                ),
                rule(Field::ExpirySeconds, RuleTarget::NodeText, r"(?i)\b(\d{1,3})\s*s\b"),
            ],
            noise_phrases: [
                "estás conectado",
                "estas conectado",
                "espera una solicitud de viaje",
                "tienes un mensaje nuevo",
                "multiplica tus ganancias",
                "promoción",
                "promo",
                "recompensa",
                "bono",
                "bonificación",
                "didi moto",
                "consejos",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            offer_hints: [
                "nueva solicitud",
                "nueva orden",
                "nueva oferta",
                "solicitud de viaje",
                "pedido",
                "viaje",
                "recogida",
                "pickup",
                "new request",
                "new order",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            allowed_packages: [
                "com.didiglobal.driver",
                "com.xiaojukeji.driver",
                "com.sdu.didi.psdriver",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_compiles() {
        let compiled = RuleSetSpec::default().compile();
        assert!(compiled.is_ok());
    }

    #[test]
    fn test_default_table_covers_every_field() {
        let spec = RuleSetSpec::default();
        for field in Field::ALL {
            assert!(
                spec.rules.iter().any(|r| r.field == field),
                "no default rule for {:?}",
                field
            );
        }
    }

    #[test]
    fn test_default_table_serializes_to_json() {
        // The bundled table doubles as the documentation example for
        // external rule files.
        let json = serde_json::to_string_pretty(&RuleSetSpec::default()).unwrap();
        let back = RuleSetSpec::from_json_str(&json).unwrap();
        assert_eq!(back.rules.len(), RuleSetSpec::default().rules.len());
    }
}
