//! Datagram categories: the six-value classification driving comparison
//! dispatch.
//!
//! Every datagram the apparatus produces falls into one of exactly six
//! categories, the cross product of [`TransitionKind`] and [`StreamKind`].
//! The comparator never looks at anything else to choose a strategy.

use crate::dgram::{StreamDgram, StreamKind, TransitionKind};

/// The (transition kind, stream kind) classification of one datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DgramCategory {
    /// Data event or control transition.
    pub kind: TransitionKind,
    /// Acquisition role of the originating stream.
    pub stream: StreamKind,
}

impl DgramCategory {
    /// Creates a category.
    #[inline]
    pub const fn new(kind: TransitionKind, stream: StreamKind) -> Self {
        Self { kind, stream }
    }

    /// All six categories, in a fixed order.
    pub const ALL: [Self; 6] = [
        Self::new(TransitionKind::DataEvent, StreamKind::Primary),
        Self::new(TransitionKind::DataEvent, StreamKind::SyncControl),
        Self::new(TransitionKind::DataEvent, StreamKind::IndependentControl),
        Self::new(TransitionKind::ControlTransition, StreamKind::Primary),
        Self::new(TransitionKind::ControlTransition, StreamKind::SyncControl),
        Self::new(TransitionKind::ControlTransition, StreamKind::IndependentControl),
    ];

    /// Classifies a datagram.
    ///
    /// A sentinel classifies as the defensive default (data event on the
    /// primary stream); it has no category of its own, and callers ordering
    /// datagrams must filter sentinels out first. The comparator does so and
    /// raises a diagnostic when asked to categorize one.
    pub fn classify(dg: &StreamDgram) -> Self {
        match dg {
            StreamDgram::Empty => Self::new(TransitionKind::DataEvent, StreamKind::Primary),
            StreamDgram::Populated(dgram) => Self::new(dgram.kind, dgram.stream),
        }
    }
}

impl std::fmt::Display for DgramCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.stream)
    }
}
