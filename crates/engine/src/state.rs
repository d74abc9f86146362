//! Order lifecycle state machine.

use crate::stats::SessionStats;
use ridelens_order::OrderRecord;
use serde::{Deserialize, Serialize};

/// Driver decision relayed from the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

/// The single source of truth the overlay renders from.
///
/// Exactly one instance exists at a time, owned by the pipeline worker.
/// Every emitted value is a full replacement snapshot, never a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayState {
    #[default]
    Idle,
    PendingOrder(OrderRecord),
    Expired(OrderRecord),
    Decided(OrderRecord, Decision),
}

impl OverlayState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PendingOrder(_) => "pending_order",
            Self::Expired(_) => "expired",
            Self::Decided(..) => "decided",
        }
    }

    /// The tracked order while one is actively pending.
    pub fn pending_order(&self) -> Option<&OrderRecord> {
        match self {
            Self::PendingOrder(order) => Some(order),
            _ => None,
        }
    }

    /// The order carried by any non-idle state.
    pub fn order(&self) -> Option<&OrderRecord> {
        match self {
            Self::Idle => None,
            Self::PendingOrder(order) | Self::Expired(order) | Self::Decided(order, _) => {
                Some(order)
            }
        }
    }

    /// Terminal states wait for a reset (or a superseding new order).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired(_) | Self::Decided(..))
    }
}

/// Inputs driving lifecycle transitions.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    NewOrder(OrderRecord),
    Update(OrderRecord),
    Decide(Decision),
    Timeout,
    Reset,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewOrder(_) => "new_order",
            Self::Update(_) => "update",
            Self::Decide(_) => "decide",
            Self::Timeout => "timeout",
            Self::Reset => "reset",
        }
    }
}

/// Result of applying one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Observable state changed; render this snapshot.
    Signal(OverlayState),
    /// Legal input with no observable change.
    Quiet,
    /// No transition defined for this (state, input) pair; state unchanged.
    Unknown,
}

/// Owns the canonical overlay state and its transition table.
///
/// The table is exhaustive: any (state, input) pair without a defined
/// transition is a no-op reported as `Applied::Unknown`; the caller logs
/// it as an anomaly, nothing crashes.
#[derive(Debug, Default)]
pub struct OrderLifecycle {
    state: OverlayState,
    stats: SessionStats,
}

impl OrderLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn apply(&mut self, event: LifecycleEvent, now_ms: i64) -> Applied {
        use LifecycleEvent::*;
        use OverlayState::*;

        let current = std::mem::take(&mut self.state);
        let (next, applied) = match (current, event) {
            // A new order starts tracking from anywhere, replacing a
            // pending one (superseding policy is enforced upstream by the
            // deduplicator).
            (Idle | PendingOrder(_) | Decided(..) | Expired(_), NewOrder(order)) => {
                self.stats.considered += 1;
                let next = PendingOrder(order);
                let applied = Applied::Signal(next.clone());
                (next, applied)
            }

            (PendingOrder(mut tracked), Update(observed)) => {
                let display_changed = tracked.absorb(&observed);
                let next = PendingOrder(tracked);
                let applied = if display_changed {
                    Applied::Signal(next.clone())
                } else {
                    Applied::Quiet
                };
                (next, applied)
            }

            (PendingOrder(order), Decide(decision)) => {
                match decision {
                    Decision::Accept => {
                        self.stats.accepted += 1;
                        self.stats.accepted_fare_minor += order.fare.minor_units;
                    }
                    Decision::Reject => self.stats.rejected += 1,
                }
                let next = Decided(order, decision);
                let applied = Applied::Signal(next.clone());
                (next, applied)
            }

            (PendingOrder(order), Timeout) => match order.expires_at_ms {
                Some(expires) if now_ms >= expires => {
                    self.stats.expired += 1;
                    let next = Expired(order);
                    let applied = Applied::Signal(next.clone());
                    (next, applied)
                }
                // Stale wake-up: the expiry was re-armed after the timer
                // was set. Not an anomaly.
                Some(_) => (PendingOrder(order), Applied::Quiet),
                None => (PendingOrder(order), Applied::Unknown),
            },

            (PendingOrder(_) | Decided(..) | Expired(_), Reset) => {
                (Idle, Applied::Signal(Idle))
            }
            (Idle, Reset) => (Idle, Applied::Quiet),

            (other, _) => (other, Applied::Unknown),
        };

        self.state = next;
        applied
    }

    /// Drop everything and return to `Idle` without emitting. Used at
    /// shutdown, when the renderer is torn down along with the pipeline.
    pub fn teardown(&mut self) {
        self.state = OverlayState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridelens_order::Money;

    fn order(fingerprint: u64, expires_at_ms: Option<i64>) -> OrderRecord {
        OrderRecord {
            fingerprint,
            fare: Money::new(1_250, "USD"),
            distance_meters: 3_200,
            pickup: "main st".to_string(),
            dropoff: "oak ave".to_string(),
            order_id: None,
            first_seen_ms: 1_000,
            last_seen_ms: 1_000,
            expires_at_ms,
        }
    }

    #[test]
    fn test_new_order_from_idle_signals_pending() {
        let mut machine = OrderLifecycle::new();
        match machine.apply(LifecycleEvent::NewOrder(order(1, None)), 1_000) {
            Applied::Signal(OverlayState::PendingOrder(o)) => assert_eq!(o.fingerprint, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(machine.stats().considered, 1);
    }

    #[test]
    fn test_new_order_supersedes_pending() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, None)), 1_000);
        match machine.apply(LifecycleEvent::NewOrder(order(2, None)), 2_000) {
            Applied::Signal(OverlayState::PendingOrder(o)) => assert_eq!(o.fingerprint, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_identical_update_is_quiet() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, None)), 1_000);

        let mut again = order(1, None);
        again.first_seen_ms = 2_000;
        again.last_seen_ms = 2_000;
        assert_eq!(machine.apply(LifecycleEvent::Update(again), 2_000), Applied::Quiet);

        // Timestamp still refreshed even though nothing was rendered.
        assert_eq!(machine.state().pending_order().unwrap().last_seen_ms, 2_000);
    }

    #[test]
    fn test_material_update_signals() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, Some(5_000))), 1_000);

        let rearmed = order(1, Some(9_000));
        match machine.apply(LifecycleEvent::Update(rearmed), 2_000) {
            Applied::Signal(OverlayState::PendingOrder(o)) => {
                assert_eq!(o.expires_at_ms, Some(9_000));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decide_accept_tallies_fare() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, None)), 1_000);
        match machine.apply(LifecycleEvent::Decide(Decision::Accept), 2_000) {
            Applied::Signal(OverlayState::Decided(_, Decision::Accept)) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(machine.stats().accepted, 1);
        assert_eq!(machine.stats().accepted_fare_minor, 1_250);
    }

    #[test]
    fn test_timeout_before_expiry_is_quiet() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, Some(5_000))), 1_000);
        assert_eq!(machine.apply(LifecycleEvent::Timeout, 4_999), Applied::Quiet);
        assert_eq!(machine.state().name(), "pending_order");
    }

    #[test]
    fn test_timeout_at_expiry_expires() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, Some(5_000))), 1_000);
        match machine.apply(LifecycleEvent::Timeout, 5_000) {
            Applied::Signal(OverlayState::Expired(o)) => assert_eq!(o.fingerprint, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(machine.stats().expired, 1);
    }

    #[test]
    fn test_unknown_transitions_leave_state_unchanged() {
        let mut machine = OrderLifecycle::new();
        assert_eq!(machine.apply(LifecycleEvent::Timeout, 0), Applied::Unknown);
        assert_eq!(machine.apply(LifecycleEvent::Decide(Decision::Accept), 0), Applied::Unknown);
        assert_eq!(*machine.state(), OverlayState::Idle);

        machine.apply(LifecycleEvent::NewOrder(order(1, None)), 1_000);
        machine.apply(LifecycleEvent::Decide(Decision::Reject), 2_000);
        let decided = machine.state().clone();

        assert_eq!(machine.apply(LifecycleEvent::Update(order(1, None)), 3_000), Applied::Unknown);
        assert_eq!(machine.apply(LifecycleEvent::Timeout, 3_000), Applied::Unknown);
        assert_eq!(*machine.state(), decided);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, None)), 1_000);
        assert_eq!(
            machine.apply(LifecycleEvent::Reset, 2_000),
            Applied::Signal(OverlayState::Idle)
        );
        assert_eq!(machine.apply(LifecycleEvent::Reset, 2_001), Applied::Quiet);
    }

    #[test]
    fn test_new_order_allowed_after_terminal() {
        let mut machine = OrderLifecycle::new();
        machine.apply(LifecycleEvent::NewOrder(order(1, Some(2_000))), 1_000);
        machine.apply(LifecycleEvent::Timeout, 2_500);
        assert!(machine.state().is_terminal());

        match machine.apply(LifecycleEvent::NewOrder(order(2, None)), 3_000) {
            Applied::Signal(OverlayState::PendingOrder(o)) => assert_eq!(o.fingerprint, 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
