//! Advisory reporting for merge sessions.
//!
//! Conditions that deserve attention but must not change a merge decision
//! flow through [`MergeReporter`] instead of ambient process state. The
//! comparator and the driver take the reporter at construction, so each
//! composed merge session owns exactly one advisory sink.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::reader::DamageReason;

/// Sink for conditions that are reported but never alter merge decisions.
pub trait MergeReporter: Send + Sync {
    /// Categorization was requested for a sentinel datagram.
    fn classify_empty(&self);

    /// Block-strategy run ordering contradicted the raw clocks by more than
    /// the drift tolerance. The run-number decision stands.
    fn clock_contradicts_run_order(
        &self,
        earlier_run: u32,
        later_run: u32,
        skew_seconds: f64,
        tolerance_seconds: u32,
    );

    /// The duplicate oracle was consulted with at least one sentinel side.
    fn same_event_on_empty(&self, both_empty: bool);

    /// A damaged record was discarded from a stream.
    fn damaged_skipped(&self, stream_index: usize, reason: &DamageReason);
}

/// Default reporter: forwards advisories to `tracing` at WARN level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl MergeReporter for TracingReporter {
    fn classify_empty(&self) {
        tracing::warn!("category requested for an empty datagram");
    }

    fn clock_contradicts_run_order(
        &self,
        earlier_run: u32,
        later_run: u32,
        skew_seconds: f64,
        tolerance_seconds: u32,
    ) {
        tracing::warn!(
            earlier_run,
            later_run,
            skew_seconds,
            tolerance_seconds,
            "run ordering contradicts raw clocks beyond the drift tolerance"
        );
    }

    fn same_event_on_empty(&self, both_empty: bool) {
        tracing::warn!(both_empty, "duplicate check consulted on empty datagram");
    }

    fn damaged_skipped(&self, stream_index: usize, reason: &DamageReason) {
        tracing::warn!(stream_index, %reason, "skipping damaged record");
    }
}

/// An advisory captured by [`RecordingReporter`].
#[derive(Clone, Debug)]
pub struct Advisory {
    /// When the advisory was raised.
    pub at: DateTime<Utc>,
    /// Human-readable description.
    pub message: String,
}

/// Reporter that records advisories in memory, for tests and for embedders
/// that surface advisories through their own channels.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    advisories: Mutex<Vec<Advisory>>,
}

impl RecordingReporter {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the advisories recorded so far.
    pub fn advisories(&self) -> Vec<Advisory> {
        self.advisories.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Messages only, for assertion convenience.
    pub fn messages(&self) -> Vec<String> {
        self.advisories()
            .into_iter()
            .map(|a| a.message)
            .collect()
    }

    fn push(&self, message: String) {
        if let Ok(mut advisories) = self.advisories.lock() {
            advisories.push(Advisory {
                at: Utc::now(),
                message,
            });
        }
    }
}

impl MergeReporter for RecordingReporter {
    fn classify_empty(&self) {
        self.push("category requested for an empty datagram".to_string());
    }

    fn clock_contradicts_run_order(
        &self,
        earlier_run: u32,
        later_run: u32,
        skew_seconds: f64,
        tolerance_seconds: u32,
    ) {
        self.push(format!(
            "run {earlier_run} orders before run {later_run} but clocks differ by \
             {skew_seconds:.3} s (tolerance {tolerance_seconds} s)"
        ));
    }

    fn same_event_on_empty(&self, both_empty: bool) {
        self.push(format!(
            "duplicate check consulted on empty datagram (both_empty={both_empty})"
        ));
    }

    fn damaged_skipped(&self, stream_index: usize, reason: &DamageReason) {
        self.push(format!("stream {stream_index}: skipping damaged record: {reason}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_captures_in_order() {
        let reporter = RecordingReporter::new();
        reporter.classify_empty();
        reporter.clock_contradicts_run_order(5, 6, 120.0, 90);
        reporter.damaged_skipped(2, &DamageReason::Checksum);

        let messages = reporter.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("empty datagram"));
        assert!(messages[1].contains("run 5"));
        assert!(messages[1].contains("run 6"));
        assert!(messages[2].contains("stream 2"));
    }

    #[test]
    fn advisories_carry_timestamps() {
        let reporter = RecordingReporter::new();
        let before = Utc::now();
        reporter.same_event_on_empty(true);
        let advisories = reporter.advisories();
        assert_eq!(advisories.len(), 1);
        assert!(advisories[0].at >= before);
    }
}
