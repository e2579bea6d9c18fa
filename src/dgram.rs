//! Datagram records and the sentinel wrapper used by the merge driver.
//!
//! A [`Datagram`] is one decoded record from an acquisition stream: its timing
//! and sequence header fields, its provenance, and an opaque payload this crate
//! never interprets. [`StreamDgram`] wraps a datagram together with the
//! sentinel state a merge cursor needs once its stream is exhausted; the
//! comparator gives sentinels a defined position (after everything) so that a
//! finished stream is never re-selected.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::filename::ChunkFileName;

/// Clock timestamp carried in a datagram header: whole seconds plus a
/// nanosecond remainder, counted from the apparatus epoch.
///
/// Ordering is lexicographic on `(sec, nsec)`, which is the direct-clock
/// comparison used whenever two datagrams share a clock domain.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ClockTime {
    /// Whole seconds.
    pub sec: u32,
    /// Nanosecond remainder, `0..1_000_000_000`.
    pub nsec: u32,
}

impl ClockTime {
    /// Creates a clock timestamp.
    #[inline]
    pub const fn new(sec: u32, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// The timestamp as fractional seconds. Used where clocks from different
    /// domains are compared after an offset adjustment; sub-nanosecond
    /// precision is not required there.
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.sec) + f64::from(self.nsec) * 1e-9
    }
}

/// Whether a datagram is a regular data event or a control transition
/// (run begin/end, configure, and similar control messages).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// A triggered data event.
    DataEvent,
    /// Any control transition.
    ControlTransition,
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataEvent => write!(f, "DataEvent"),
            Self::ControlTransition => write!(f, "ControlTransition"),
        }
    }
}

/// Which acquisition role produced a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    /// The main acquisition stream, on the master trigger clock.
    Primary,
    /// A control-system stream triggered under the primary clock.
    SyncControl,
    /// A freely running control-system stream with its own clock.
    IndependentControl,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "Primary"),
            Self::SyncControl => write!(f, "SyncControl"),
            Self::IndependentControl => write!(f, "IndependentControl"),
        }
    }
}

/// One decoded record from an acquisition stream.
///
/// Immutable once produced by a reader; the merge driver only rewrites the
/// clock when it applies the configured time correction on emission.
#[derive(Clone, Debug, PartialEq)]
pub struct Datagram {
    /// Data event or control transition.
    pub kind: TransitionKind,
    /// Header clock timestamp.
    pub clock: ClockTime,
    /// Per-pulse fiducial counter, shared by devices on the master clock.
    pub fiducial: u32,
    /// Acquisition role of the originating stream.
    pub stream: StreamKind,
    /// Derived block number correlating control-stream data events to the
    /// primary acquisition's block structure. Meaningful only for
    /// control-stream data events; zero elsewhere.
    pub block: u64,
    /// The chunk file this record was read from; carries run and experiment.
    pub file: Arc<ChunkFileName>,
    /// Opaque event payload. Never interpreted by the merge.
    pub payload: Bytes,
}

impl Datagram {
    /// Creates a datagram with the given header fields and empty provenance
    /// and payload. Builder methods fill in the rest.
    pub fn new(kind: TransitionKind, stream: StreamKind, clock: ClockTime) -> Self {
        Self {
            kind,
            clock,
            fiducial: 0,
            stream,
            block: 0,
            file: Arc::new(ChunkFileName::default()),
            payload: Bytes::new(),
        }
    }

    /// Sets the fiducial counter.
    pub fn with_fiducial(mut self, fiducial: u32) -> Self {
        self.fiducial = fiducial;
        self
    }

    /// Sets the derived block number.
    pub fn with_block(mut self, block: u64) -> Self {
        self.block = block;
        self
    }

    /// Sets the originating chunk file.
    pub fn with_file(mut self, file: Arc<ChunkFileName>) -> Self {
        self.file = file;
        self
    }

    /// Sets the opaque payload.
    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// Run number, from the originating chunk file.
    #[inline]
    pub fn run(&self) -> u32 {
        self.file.run()
    }

    /// Experiment identifier, from the originating chunk file. Zero means
    /// unknown; the cross-experiment comparison refuses to order on it.
    #[inline]
    pub fn experiment(&self) -> u32 {
        self.file.experiment()
    }
}

/// A merge cursor's view of one stream position: a populated record, or the
/// sentinel once the stream has no more records.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StreamDgram {
    /// Sentinel: the owning stream is exhausted.
    #[default]
    Empty,
    /// A populated record.
    Populated(Datagram),
}

impl StreamDgram {
    /// Whether this is the sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The record, if populated.
    pub fn dgram(&self) -> Option<&Datagram> {
        match self {
            Self::Empty => None,
            Self::Populated(dgram) => Some(dgram),
        }
    }

    /// Consumes the wrapper, yielding the record if populated.
    pub fn into_dgram(self) -> Option<Datagram> {
        match self {
            Self::Empty => None,
            Self::Populated(dgram) => Some(dgram),
        }
    }
}
