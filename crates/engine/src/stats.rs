//! Session tallies and pipeline counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory per-session order tallies, updated by the state machine.
///
/// Reset when the service restarts; nothing is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Orders that reached the overlay.
    pub considered: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub expired: u64,
    /// Sum of accepted fares in minor units. A deployment observes a single
    /// market, so currencies are not mixed in practice.
    pub accepted_fare_minor: i64,
}

impl SessionStats {
    /// One-line progress summary for logs and the overlay header.
    pub fn progress_line(&self, goal_minor: i64) -> String {
        let percent = if goal_minor > 0 {
            (self.accepted_fare_minor as f64 / goal_minor as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        format!(
            "goal {}/{} ({percent:.0}%) · trips {}/{} a/r",
            self.accepted_fare_minor / 100,
            goal_minor / 100,
            self.accepted,
            self.rejected
        )
    }
}

/// Atomic anomaly and throughput counters, shared between the pipeline
/// handle and its worker thread. Observability without persistence.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub submitted: AtomicU64,
    pub processed: AtomicU64,
    pub overflow_dropped: AtomicU64,
    pub ignored_packages: AtomicU64,
    pub extraction_misses: AtomicU64,
    pub rejected: AtomicU64,
    pub stale_dropped: AtomicU64,
    pub unknown_transitions: AtomicU64,
    pub orders_detected: AtomicU64,
}

impl PipelineCounters {
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            overflow_dropped: self.overflow_dropped.load(Ordering::Relaxed),
            ignored_packages: self.ignored_packages.load(Ordering::Relaxed),
            extraction_misses: self.extraction_misses.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            stale_dropped: self.stale_dropped.load(Ordering::Relaxed),
            unknown_transitions: self.unknown_transitions.load(Ordering::Relaxed),
            orders_detected: self.orders_detected.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    pub submitted: u64,
    pub processed: u64,
    pub overflow_dropped: u64,
    pub ignored_packages: u64,
    pub extraction_misses: u64,
    pub rejected: u64,
    pub stale_dropped: u64,
    pub unknown_transitions: u64,
    pub orders_detected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line() {
        let stats = SessionStats {
            considered: 5,
            accepted: 3,
            rejected: 1,
            expired: 1,
            accepted_fare_minor: 1_200_000,
        };
        assert_eq!(
            stats.progress_line(12_000_000),
            "goal 12000/120000 (10%) · trips 3/1 a/r"
        );
    }

    #[test]
    fn test_progress_line_zero_goal() {
        let stats = SessionStats::default();
        assert_eq!(stats.progress_line(0), "goal 0/0 (0%) · trips 0/0 a/r");
    }

    #[test]
    fn test_counter_snapshot() {
        let counters = PipelineCounters::default();
        counters.submitted.fetch_add(3, Ordering::Relaxed);
        counters.overflow_dropped.fetch_add(1, Ordering::Relaxed);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.submitted, 3);
        assert_eq!(snapshot.overflow_dropped, 1);
        assert_eq!(snapshot.processed, 0);
    }
}
