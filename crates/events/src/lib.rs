//! Raw event contracts for the order extraction pipeline.
//!
//! This crate defines the formal shapes of the two inbound streams the
//! engine observes: accessibility-tree snapshots and posted notifications.
//! Using shared types keeps the service glue, the extractor and the tests
//! agreed on field names; everything here is plain immutable data.

mod node;
mod raw;

pub use node::UiNode;
pub use raw::RawEvent;

/// Current wall-clock time in milliseconds since epoch.
///
/// Event timestamps are produced by the service glue at callback time; this
/// helper keeps the representation consistent across crates.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_is_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }
}
