//! Merge session errors.
//!
//! One error type covers the whole crate. Three families matter to callers:
//! configuration errors (bad merge mode, unresolvable clock offset) are fatal
//! and never retried; modeling errors (unknown category pair, block comparison
//! on mismatched kinds, undesigned duplicate policy) mean the apparatus is
//! outside the fixed six-category model and are likewise fatal; data errors
//! (damaged records) are recoverable only through the skip-damaged policy.

use thiserror::Error;

use crate::category::DgramCategory;
use crate::reader::DamageReason;

/// Error type for datagram merge operations.
#[derive(Error, Debug)]
pub enum MergeError {
    /// A merge-mode designation matched none of the known modes.
    #[error("invalid merge mode {0:?}, expected OneStream, NoChunking or FileName")]
    InvalidMergeMode(String),

    /// No comparison rule covers this category pair. Unreachable for the six
    /// known categories; seeing it means an unmodeled stream kind or a rule
    /// table construction bug.
    #[error("no comparison rule for category pair {a} vs {b}")]
    UnknownComparison {
        /// Category of the left-hand datagram.
        a: DgramCategory,
        /// Category of the right-hand datagram.
        b: DgramCategory,
    },

    /// The block strategy was dispatched for two datagrams of the same
    /// transition kind; the rule table and the strategy disagree about what
    /// this pair needs.
    #[error("block comparison needs one data event and one transition, got {a} vs {b}")]
    CategoryTableConflict {
        /// Category of the left-hand datagram.
        a: DgramCategory,
        /// Category of the right-hand datagram.
        b: DgramCategory,
    },

    /// The cross-experiment comparison could not resolve a clock offset:
    /// an experiment number is zero, no offset table was supplied, or the
    /// table has no entry for the pair in either order.
    #[error("no clock offset between experiments {exp_a} and {exp_b}")]
    NoClockOffset {
        /// Experiment number of the left-hand datagram.
        exp_a: u32,
        /// Experiment number of the right-hand datagram.
        exp_b: u32,
    },

    /// Cross-stream duplicate detection was asked about two populated
    /// datagrams; no equality policy is defined for that and none is guessed.
    #[error("no duplicate-detection policy for two populated datagrams")]
    DuplicatePolicyUndefined,

    /// A damaged record was read and skipping damaged records is disabled.
    #[error("damaged record in stream {stream}: {reason}")]
    DamagedRecord {
        /// Index of the owning stream within the merge session.
        stream: usize,
        /// What was wrong with the record.
        reason: DamageReason,
    },

    /// Underlying reader I/O failure (truncated or missing chunk, and the
    /// like). Always fatal.
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dgram::{StreamKind, TransitionKind};

    #[test]
    fn messages_name_the_offending_inputs() {
        let err = MergeError::InvalidMergeMode("Shuffled".to_string());
        assert!(err.to_string().contains("Shuffled"));

        let err = MergeError::UnknownComparison {
            a: DgramCategory::new(TransitionKind::DataEvent, StreamKind::Primary),
            b: DgramCategory::new(TransitionKind::ControlTransition, StreamKind::SyncControl),
        };
        assert!(err.to_string().contains("DataEvent/Primary"));
        assert!(err.to_string().contains("ControlTransition/SyncControl"));

        let err = MergeError::NoClockOffset { exp_a: 0, exp_b: 7 };
        assert!(err.to_string().contains('0'));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short chunk");
        let err = MergeError::from(io);
        assert!(matches!(err, MergeError::Io(_)));
    }
}
