//! Render sink abstraction for decoupled overlay updates.
//!
//! Provides a trait-based abstraction over snapshot delivery, allowing the
//! core pipeline to be tested without any window glue and enabling headless
//! operation.

use crate::state::OverlayState;
use std::sync::{Arc, Mutex};

/// Receives overlay snapshots emitted by the state machine.
///
/// Each delivered value is a full replacement of the prior display state,
/// not a diff. Implementations must not block for long: they run on the
/// pipeline worker thread.
pub trait RenderSink: Send + Sync {
    fn render(&self, state: &OverlayState);
}

/// Type alias for shared render sink reference.
pub type RenderSinkRef = Arc<dyn RenderSink>;

/// In-memory sink for testing.
///
/// Captures every delivered snapshot for later inspection.
#[derive(Default)]
pub struct MemorySink {
    states: Mutex<Vec<OverlayState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured snapshots, oldest first.
    pub fn states(&self) -> Vec<OverlayState> {
        self.states.lock().unwrap().clone()
    }

    /// The most recent snapshot, if any.
    pub fn last(&self) -> Option<OverlayState> {
        self.states.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.states.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.states.lock().unwrap().clear();
    }
}

impl RenderSink for MemorySink {
    fn render(&self, state: &OverlayState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

/// Sink that discards all renders.
///
/// Useful for benchmarks or when only the counters matter.
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&self, _state: &OverlayState) {
        // Intentionally empty
    }
}
