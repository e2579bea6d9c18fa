//! Per-stream datagram readers.
//!
//! The merge driver pulls records through [`DgramReader`], one implementation
//! per logical stream. Container decoding and chunk continuation live behind
//! this trait in the embedding application; the driver only sees decoded
//! datagrams, damage reports, and end of stream.

use std::collections::VecDeque;

use async_trait::async_trait;
use thiserror::Error;

use crate::dgram::Datagram;
use crate::error::MergeError;

/// Why a record was rejected as damaged.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DamageReason {
    /// The record ended mid-payload.
    #[error("record truncated mid-payload")]
    Truncated,
    /// Header or payload checksum mismatch.
    #[error("checksum mismatch")]
    Checksum,
    /// The record exceeds the configured datagram size bound.
    #[error("record of {len} bytes exceeds the {max}-byte limit")]
    Oversized {
        /// Size the record declared.
        len: usize,
        /// Configured upper bound.
        max: usize,
    },
}

/// One pull from a stream.
///
/// Damage is an outcome rather than an error because it is recoverable under
/// the skip-damaged policy; reader I/O failures are `Err` and always fatal.
#[derive(Clone, Debug)]
pub enum ReadOutcome {
    /// A well-formed datagram.
    Dgram(Datagram),
    /// A record was present but unusable.
    Damaged(DamageReason),
    /// The stream, including all of its continuation chunks, is exhausted.
    EndOfStream,
}

/// Pull interface over one logical stream.
#[async_trait]
pub trait DgramReader: Send {
    /// Reads the next record. Implementations keep returning
    /// [`ReadOutcome::EndOfStream`] once exhausted.
    async fn read(&mut self) -> Result<ReadOutcome, MergeError>;
}

/// In-memory reader over a queue of outcomes.
///
/// Used by tests and by embedders that already hold decoded datagrams; it
/// returns its outcomes in order and then reports end of stream forever.
#[derive(Debug, Default)]
pub struct QueueReader {
    outcomes: VecDeque<ReadOutcome>,
}

impl QueueReader {
    /// Creates a reader over the given outcomes.
    pub fn new(outcomes: impl IntoIterator<Item = ReadOutcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }

    /// Creates a reader that yields the given datagrams undamaged.
    pub fn from_dgrams(dgrams: impl IntoIterator<Item = Datagram>) -> Self {
        Self::new(dgrams.into_iter().map(ReadOutcome::Dgram))
    }
}

#[async_trait]
impl DgramReader for QueueReader {
    async fn read(&mut self) -> Result<ReadOutcome, MergeError> {
        Ok(self
            .outcomes
            .pop_front()
            .unwrap_or(ReadOutcome::EndOfStream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dgram::{ClockTime, StreamKind, TransitionKind};

    fn event(sec: u32) -> Datagram {
        Datagram::new(
            TransitionKind::DataEvent,
            StreamKind::Primary,
            ClockTime::new(sec, 0),
        )
    }

    #[tokio::test]
    async fn yields_outcomes_then_end_of_stream_forever() {
        let mut reader = QueueReader::new([
            ReadOutcome::Dgram(event(1)),
            ReadOutcome::Damaged(DamageReason::Truncated),
        ]);

        assert!(matches!(reader.read().await.unwrap(), ReadOutcome::Dgram(_)));
        assert!(matches!(
            reader.read().await.unwrap(),
            ReadOutcome::Damaged(DamageReason::Truncated)
        ));
        assert!(matches!(reader.read().await.unwrap(), ReadOutcome::EndOfStream));
        assert!(matches!(reader.read().await.unwrap(), ReadOutcome::EndOfStream));
    }

    #[tokio::test]
    async fn from_dgrams_wraps_undamaged() {
        let mut reader = QueueReader::from_dgrams([event(1), event(2)]);
        for expected in [1u32, 2] {
            match reader.read().await.unwrap() {
                ReadOutcome::Dgram(dg) => assert_eq!(dg.clock.sec, expected),
                other => panic!("expected a datagram, got {other:?}"),
            }
        }
        assert!(matches!(reader.read().await.unwrap(), ReadOutcome::EndOfStream));
    }

    #[test]
    fn damage_reasons_describe_themselves() {
        let reason = DamageReason::Oversized { len: 64, max: 32 };
        let text = reason.to_string();
        assert!(text.contains("64"));
        assert!(text.contains("32"));
    }
}
