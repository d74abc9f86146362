//! Event pipeline coordinator.
//!
//! Two OS callback threads feed one bounded channel; a dedicated worker
//! thread consumes it in strict arrival order and exclusively owns every
//! piece of mutable order state (extractor, deduplicator, lifecycle). This
//! is the only concurrency boundary in the core: races on `OverlayState`
//! are impossible by construction.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use ridelens_events::{now_ms, RawEvent};
use ridelens_extract::Extractor;
use ridelens_order::{normalize_with, recommend, DedupDecision, Deduplicator};
use ridelens_rules::CompiledRules;

use crate::config::EngineConfig;
use crate::sink::RenderSinkRef;
use crate::state::{Applied, Decision, LifecycleEvent, OrderLifecycle, OverlayState};
use crate::stats::{PipelineCounters, PipelineSnapshot, SessionStats};

/// Message consumed by the worker, in strict arrival order.
enum WorkerMsg {
    Event(RawEvent),
    Decide(Decision),
    Reset,
    Shutdown,
}

/// Handle to the running pipeline.
///
/// `submit` is safe to call from any thread and never blocks beyond a
/// bounded-queue push. Dropping the handle shuts the worker down: the queue
/// is drained without processing and the state resets to idle.
pub struct Pipeline {
    tx: Sender<WorkerMsg>,
    /// Drop-oldest handle: on a full queue the submitter pops one stale
    /// message before retrying, so the newest event always gets in.
    overflow_rx: Receiver<WorkerMsg>,
    counters: Arc<PipelineCounters>,
    shared_state: Arc<Mutex<OverlayState>>,
    shared_stats: Arc<Mutex<SessionStats>>,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Start the worker thread and return the handle.
    pub fn spawn(config: EngineConfig, rules: CompiledRules, sink: RenderSinkRef) -> Self {
        let (tx, rx) = bounded(config.queue_bound.max(1));
        let overflow_rx = rx.clone();
        let counters = Arc::new(PipelineCounters::default());
        let shared_state = Arc::new(Mutex::new(OverlayState::Idle));
        let shared_stats = Arc::new(Mutex::new(SessionStats::default()));

        let worker = Worker {
            extractor: Extractor::new(rules),
            dedup: Deduplicator::new(config.min_redetect_ms, config.supersede_pending),
            lifecycle: OrderLifecycle::new(),
            sink,
            counters: Arc::clone(&counters),
            shared_state: Arc::clone(&shared_state),
            shared_stats: Arc::clone(&shared_stats),
            config,
        };
        let handle = std::thread::spawn(move || worker.run(rx));

        Self {
            tx,
            overflow_rx,
            counters,
            shared_state,
            shared_stats,
            worker: Some(handle),
        }
    }

    /// Non-blocking enqueue from an OS callback thread.
    ///
    /// A full queue sheds the *oldest* unprocessed message, never the
    /// newest: stale context is worth less than the latest screen state.
    pub fn submit(&self, event: RawEvent) {
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        self.push(WorkerMsg::Event(event));
    }

    /// Relay the driver's decision from the overlay.
    pub fn decide(&self, decision: Decision) {
        self.push(WorkerMsg::Decide(decision));
    }

    /// Dismiss the overlay and return to idle.
    pub fn reset(&self) {
        self.push(WorkerMsg::Reset);
    }

    /// Latest emitted snapshot, for late subscribers.
    pub fn overlay_state(&self) -> OverlayState {
        self.shared_state
            .lock()
            .map(|s| s.clone())
            .unwrap_or(OverlayState::Idle)
    }

    /// Session order tallies.
    pub fn session_stats(&self) -> SessionStats {
        self.shared_stats
            .lock()
            .map(|s| *s)
            .unwrap_or_default()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> PipelineSnapshot {
        self.counters.snapshot()
    }

    fn push(&self, msg: WorkerMsg) {
        let mut msg = msg;
        loop {
            match self.tx.try_send(msg) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    msg = back;
                    // Shedding may occasionally hit a queued control input;
                    // decisions are re-sendable UI inputs, so dropping the
                    // head is still the right trade.
                    if self.overflow_rx.try_recv().is_ok() {
                        self.counters.overflow_dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!("event queue full, dropped oldest message");
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    tracing::warn!("pipeline worker gone, message dropped");
                    return;
                }
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.push(WorkerMsg::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// State owned exclusively by the worker thread.
struct Worker {
    extractor: Extractor,
    dedup: Deduplicator,
    lifecycle: OrderLifecycle,
    sink: RenderSinkRef,
    counters: Arc<PipelineCounters>,
    shared_state: Arc<Mutex<OverlayState>>,
    shared_stats: Arc<Mutex<SessionStats>>,
    config: EngineConfig,
}

impl Worker {
    fn run(mut self, rx: Receiver<WorkerMsg>) {
        tracing::info!("pipeline worker started");

        loop {
            let msg = match self.expiry_deadline() {
                Some(deadline) => match rx.recv_deadline(deadline) {
                    Ok(msg) => msg,
                    Err(RecvTimeoutError::Timeout) => {
                        // Expiry is a synthetic input on the same serialized
                        // path, never a second mutator thread.
                        self.apply(LifecycleEvent::Timeout, now_ms());
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match rx.recv() {
                    Ok(msg) => msg,
                    Err(_) => break,
                },
            };

            match msg {
                WorkerMsg::Event(event) => {
                    self.process_event(event);
                    self.counters.processed.fetch_add(1, Ordering::Relaxed);
                }
                WorkerMsg::Decide(decision) => {
                    self.apply(LifecycleEvent::Decide(decision), now_ms());
                }
                WorkerMsg::Reset => self.apply(LifecycleEvent::Reset, now_ms()),
                WorkerMsg::Shutdown => {
                    let mut drained = 0usize;
                    while rx.try_recv().is_ok() {
                        drained += 1;
                    }
                    if drained > 0 {
                        tracing::debug!(drained, "queue drained without processing at shutdown");
                    }
                    self.lifecycle.teardown();
                    if let Ok(mut shared) = self.shared_state.lock() {
                        *shared = OverlayState::Idle;
                    }
                    break;
                }
            }
        }

        tracing::info!("pipeline worker stopped");
    }

    /// Wake-up instant for the tracked order's expiry, with grace.
    fn expiry_deadline(&self) -> Option<Instant> {
        let expires = self.lifecycle.state().pending_order()?.expires_at_ms?;
        let grace = self.config.expiry_grace_ms as i64;
        let delta = (expires + grace).saturating_sub(now_ms()).max(0);
        Some(Instant::now() + Duration::from_millis(delta as u64))
    }

    fn process_event(&mut self, event: RawEvent) {
        if !self.extractor.rules().package_allowed(event.package()) {
            self.counters.ignored_packages.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(package = event.package(), "event from unobserved package");
            return;
        }

        let ts = event.timestamp_ms();
        let fields = self.extractor.extract(&event);
        if fields.is_empty() {
            self.counters.extraction_misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("no extraction rule fired, event dropped");
            return;
        }

        let record = match normalize_with(&fields, ts, &self.config.normalizer) {
            Ok(record) => record,
            Err(reason) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%reason, "field set rejected, tracked order unchanged");
                return;
            }
        };

        let decision = self
            .dedup
            .classify(&record, self.lifecycle.state().pending_order(), ts);
        match decision {
            DedupDecision::Stale => {
                self.counters.stale_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(fingerprint = record.fingerprint, "stale duplicate dropped");
            }
            DedupDecision::UpdateOf(fingerprint) => {
                tracing::debug!(fingerprint, "tracked order re-observed");
                self.apply(LifecycleEvent::Update(record), ts);
            }
            DedupDecision::NewOrder => {
                self.counters.orders_detected.fetch_add(1, Ordering::Relaxed);
                let advice = recommend(&record, &self.config.recommend);
                tracing::info!(
                    fingerprint = record.fingerprint,
                    fare = %record.fare,
                    distance_m = record.distance_meters,
                    advice = ?advice.advice,
                    reason = %advice.reason,
                    "new order detected"
                );
                self.apply(LifecycleEvent::NewOrder(record), ts);
            }
        }
    }

    fn apply(&mut self, event: LifecycleEvent, now_ms: i64) {
        let input = event.name();
        match self.lifecycle.apply(event, now_ms) {
            Applied::Signal(state) => {
                // Anchor the re-detection window to the transition, so a
                // trailing re-render of a just-decided order stays stale.
                if let Some(order) = state.order() {
                    self.dedup.note_transition(order.fingerprint, now_ms);
                }
                if let Ok(mut shared) = self.shared_state.lock() {
                    *shared = state.clone();
                }
                if let Ok(mut stats) = self.shared_stats.lock() {
                    *stats = *self.lifecycle.stats();
                }
                tracing::debug!(state = state.name(), "render signal");
                self.sink.render(&state);
            }
            Applied::Quiet => {}
            Applied::Unknown => {
                self.counters.unknown_transitions.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    state = self.lifecycle.state().name(),
                    input,
                    "transition not defined, ignoring"
                );
            }
        }
    }
}
