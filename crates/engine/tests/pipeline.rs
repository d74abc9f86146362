//! Integration tests for the full pipeline.
//!
//! Raw events go in through `Pipeline::submit`; overlay snapshots come out
//! through a test sink. Everything in between runs on the real worker
//! thread with the bundled rule table.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ridelens_engine::{
    Decision, EngineConfig, MemorySink, OverlayState, Pipeline, RenderSink,
};
use ridelens_events::{now_ms, RawEvent, UiNode};
use ridelens_rules::default_rules;

const DRIVER_PKG: &str = "com.didiglobal.driver";

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Snapshot tree for an offer with the given whole-dollar fare.
fn offer_tree(fare_major: u32) -> UiNode {
    UiNode::new().with_children(vec![
        UiNode::labeled("com.didiglobal.driver:id/fare", format!("${fare_major}.00")),
        UiNode::text("3.2 km"),
        UiNode::text("Pickup: Main St"),
        UiNode::text("Dropoff: Oak Ave"),
    ])
}

fn offer_event(fare_major: u32) -> RawEvent {
    RawEvent::snapshot(offer_tree(fare_major), now_ms(), DRIVER_PKG)
}

/// Poll until the predicate holds or the timeout passes.
fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

#[test]
fn test_snapshot_becomes_pending_order() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::spawn(EngineConfig::default(), default_rules(), sink.clone());

    pipeline.submit(offer_event(12));

    assert!(wait_until(Duration::from_secs(3), || !sink.is_empty()));
    match sink.last() {
        Some(OverlayState::PendingOrder(order)) => {
            assert_eq!(order.fare.minor_units, 1_200);
            assert_eq!(order.fare.currency, "USD");
            assert_eq!(order.distance_meters, 3_200);
            assert_eq!(order.pickup, "Main St");
            assert_eq!(order.dropoff, "Oak Ave");
        }
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(pipeline.stats().orders_detected, 1);
    assert_eq!(pipeline.overlay_state(), sink.last().unwrap());
}

#[test]
fn test_identical_resubmission_emits_no_second_render() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::spawn(EngineConfig::default(), default_rules(), sink.clone());

    pipeline.submit(offer_event(12));
    assert!(wait_until(Duration::from_secs(3), || !sink.is_empty()));

    // Same offer observed again a moment later: classified as an update,
    // nothing the overlay displays changed, so no render signal.
    pipeline.submit(offer_event(12));
    assert!(wait_until(Duration::from_secs(3), || {
        pipeline.stats().processed == 2
    }));

    assert_eq!(sink.len(), 1);
    assert_eq!(pipeline.stats().orders_detected, 1);
}

#[test]
fn test_rejected_notification_leaves_state_unchanged() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::spawn(EngineConfig::default(), default_rules(), sink.clone());

    // Carries an offer hint and a pickup, but no fare: rejected by the
    // normalizer, overlay stays idle.
    pipeline.submit(RawEvent::notification(
        "Nueva solicitud de viaje",
        "Recogida: Calle 10",
        now_ms(),
        DRIVER_PKG,
    ));

    assert!(wait_until(Duration::from_secs(3), || {
        pipeline.stats().rejected == 1
    }));
    assert!(sink.is_empty());
    assert_eq!(pipeline.overlay_state(), OverlayState::Idle);
}

#[test]
fn test_noise_notification_is_an_extraction_miss() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::spawn(EngineConfig::default(), default_rules(), sink.clone());

    pipeline.submit(RawEvent::notification(
        "DiDi",
        "Multiplica tus ganancias con la promoción de hoy",
        now_ms(),
        DRIVER_PKG,
    ));

    assert!(wait_until(Duration::from_secs(3), || {
        pipeline.stats().extraction_misses == 1
    }));
    assert!(sink.is_empty());
}

#[test]
fn test_foreign_package_is_ignored() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::spawn(EngineConfig::default(), default_rules(), sink.clone());

    pipeline.submit(RawEvent::snapshot(offer_tree(12), now_ms(), "com.whatsapp"));

    assert!(wait_until(Duration::from_secs(3), || {
        pipeline.stats().ignored_packages == 1
    }));
    assert!(sink.is_empty());
}

#[test]
fn test_decision_moves_order_to_decided() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::spawn(EngineConfig::default(), default_rules(), sink.clone());

    pipeline.submit(offer_event(12));
    assert!(wait_until(Duration::from_secs(3), || !sink.is_empty()));

    pipeline.decide(Decision::Accept);
    assert!(wait_until(Duration::from_secs(3), || {
        matches!(sink.last(), Some(OverlayState::Decided(_, Decision::Accept)))
    }));
    assert_eq!(pipeline.session_stats().accepted, 1);
    assert_eq!(pipeline.session_stats().accepted_fare_minor, 1_200);

    // Dismissing afterwards returns the overlay to idle.
    pipeline.reset();
    assert!(wait_until(Duration::from_secs(3), || {
        matches!(sink.last(), Some(OverlayState::Idle))
    }));
}

#[test]
fn test_pending_order_expires_after_countdown() {
    init_logging();
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::spawn(EngineConfig::default(), default_rules(), sink.clone());

    let tree = UiNode::new().with_children(vec![
        UiNode::labeled("com.didiglobal.driver:id/fare", "$12.50"),
        UiNode::text("Pickup: Main St"),
        UiNode::labeled("com.didiglobal.driver:id/countdown", "1"),
    ]);
    pipeline.submit(RawEvent::snapshot(tree, now_ms(), DRIVER_PKG));

    assert!(wait_until(Duration::from_secs(3), || !sink.is_empty()));
    // The first emitted snapshot is always the pending order, even if the
    // expiry has already fired by the time this thread gets scheduled.
    let expires_at = match sink.states().first() {
        Some(OverlayState::PendingOrder(order)) => {
            order.expires_at_ms.expect("countdown should set expiry")
        }
        other => panic!("unexpected state {other:?}"),
    };

    assert!(wait_until(Duration::from_secs(4), || {
        matches!(sink.last(), Some(OverlayState::Expired(_)))
    }));
    // At or after the expiry instant, never before.
    assert!(now_ms() >= expires_at);
    assert_eq!(pipeline.session_stats().expired, 1);
}

/// Sink that parks the worker inside `render` until released, so the queue
/// can be filled deterministically.
struct GateSink {
    rendered: crossbeam_channel::Sender<OverlayState>,
    release: crossbeam_channel::Receiver<()>,
}

impl RenderSink for GateSink {
    fn render(&self, state: &OverlayState) {
        let _ = self.rendered.send(state.clone());
        let _ = self.release.recv();
    }
}

#[test]
fn test_full_queue_drops_oldest_and_keeps_newest_in_order() {
    init_logging();
    let (rendered_tx, rendered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    let sink = Arc::new(GateSink {
        rendered: rendered_tx,
        release: release_rx,
    });

    let config = EngineConfig {
        queue_bound: 8,
        ..EngineConfig::default()
    };
    let pipeline = Pipeline::spawn(config, default_rules(), sink);

    // First offer: the worker dequeues it and parks inside render.
    pipeline.submit(offer_event(10));
    let first = rendered_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("first render");
    match first {
        OverlayState::PendingOrder(order) => assert_eq!(order.fare.minor_units, 1_000),
        other => panic!("unexpected state {other:?}"),
    }

    // Ten more offers against a queue of eight: the two oldest are shed.
    for fare in 11..=20 {
        pipeline.submit(offer_event(fare));
    }
    assert_eq!(pipeline.stats().overflow_dropped, 2);

    for _ in 0..32 {
        let _ = release_tx.send(());
    }

    // The surviving eight process in arrival order.
    let mut fares = Vec::new();
    while let Ok(state) = rendered_rx.recv_timeout(Duration::from_secs(3)) {
        if let OverlayState::PendingOrder(order) = state {
            fares.push(order.fare.minor_units / 100);
        }
        if fares.len() == 8 {
            break;
        }
    }
    assert_eq!(fares, vec![13, 14, 15, 16, 17, 18, 19, 20]);

    assert!(wait_until(Duration::from_secs(3), || {
        pipeline.stats().processed == 9
    }));
    let stats = pipeline.stats();
    assert_eq!(stats.submitted, 11);
    assert_eq!(stats.overflow_dropped, 2);
}
