//! Progress gating: keeps the percentages delivered to a sink monotonically
//! non-decreasing within one attempt, and lets the orchestrator reset them to
//! zero between attempts.

use std::sync::atomic::{AtomicI16, Ordering};
use std::sync::Arc;

use crate::models::upload::{ProgressCallback, UploadProgress};

/// Admits a percentage only if it is strictly above everything seen so far.
#[derive(Debug)]
pub struct MonotonicGate {
    last: AtomicI16,
}

impl Default for MonotonicGate {
    fn default() -> Self {
        Self {
            last: AtomicI16::new(-1),
        }
    }
}

impl MonotonicGate {
    pub fn admit(&self, percentage: u8) -> bool {
        let pct = i16::from(percentage.min(100));
        let prev = self.last.fetch_max(pct, Ordering::AcqRel);
        pct > prev
    }

    pub fn last(&self) -> Option<u8> {
        let v = self.last.load(Ordering::Acquire);
        (v >= 0).then_some(v as u8)
    }
}

/// Per-attempt progress forwarder for uploads.
pub struct UploadProgressTracker {
    gate: MonotonicGate,
    sink: Option<ProgressCallback>,
}

impl UploadProgressTracker {
    /// Start a new attempt: the sink immediately sees 0 %.
    pub fn start(sink: Option<ProgressCallback>) -> Arc<Self> {
        let tracker = Arc::new(Self {
            gate: MonotonicGate::default(),
            sink,
        });
        tracker.report(UploadProgress::percent(0));
        tracker
    }

    pub fn report(&self, progress: UploadProgress) {
        if self.gate.admit(progress.percentage) {
            if let Some(sink) = &self.sink {
                sink(progress);
            }
        }
    }

    /// Callback to hand to a handler; routes through the gate.
    pub fn callback(self: &Arc<Self>) -> ProgressCallback {
        let this = self.clone();
        Arc::new(move |p| this.report(p))
    }

    pub fn last_percentage(&self) -> Option<u8> {
        self.gate.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_sink() -> (ProgressCallback, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sink: ProgressCallback = Arc::new(move |p: UploadProgress| {
            seen_clone.lock().unwrap().push(p.percentage);
        });
        (sink, seen)
    }

    #[test]
    fn test_gate_admits_first_zero() {
        let gate = MonotonicGate::default();
        assert!(gate.admit(0));
        assert!(!gate.admit(0));
        assert_eq!(gate.last(), Some(0));
    }

    #[test]
    fn test_gate_rejects_regression() {
        let gate = MonotonicGate::default();
        assert!(gate.admit(40));
        assert!(!gate.admit(30));
        assert!(gate.admit(41));
        assert_eq!(gate.last(), Some(41));
    }

    #[test]
    fn test_gate_clamps_above_100() {
        let gate = MonotonicGate::default();
        assert!(gate.admit(200));
        assert_eq!(gate.last(), Some(100));
        assert!(!gate.admit(100));
    }

    #[test]
    fn test_tracker_starts_at_zero_and_filters() {
        let (sink, seen) = recording_sink();
        let tracker = UploadProgressTracker::start(Some(sink));
        let cb = tracker.callback();
        cb(UploadProgress::from_bytes(50, 100));
        cb(UploadProgress::from_bytes(25, 100));
        cb(UploadProgress::from_bytes(100, 100));
        assert_eq!(*seen.lock().unwrap(), vec![0, 50, 100]);
        assert_eq!(tracker.last_percentage(), Some(100));
    }

    #[test]
    fn test_new_attempt_resets_to_zero() {
        let (sink, seen) = recording_sink();
        let first = UploadProgressTracker::start(Some(sink.clone()));
        first.report(UploadProgress::percent(70));
        let _second = UploadProgressTracker::start(Some(sink));
        assert_eq!(*seen.lock().unwrap(), vec![0, 70, 0]);
    }

    #[test]
    fn test_tracker_without_sink_is_silent() {
        let tracker = UploadProgressTracker::start(None);
        tracker.report(UploadProgress::percent(10));
        assert_eq!(tracker.last_percentage(), Some(10));
    }
}
