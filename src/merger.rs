//! The pull-based merge driver.
//!
//! [`StreamMerger`] owns one reader and one head datagram per input stream.
//! Each call to [`next`](StreamMerger::next) ranks the heads with the
//! comparator, emits the earliest one with the configured time correction
//! applied, and refills the winning stream. The emitted sequence is totally
//! ordered except for the deterministic tie-break: equally ranked heads
//! resolve to the lowest stream index.

use std::sync::Arc;

use async_stream::try_stream;
use futures::Stream;

use crate::compare::DgramComparator;
use crate::config::MergeConfig;
use crate::dgram::{Datagram, StreamDgram};
use crate::error::MergeError;
use crate::offset::ExperimentClockOffsetTable;
use crate::reader::{DamageReason, DgramReader, ReadOutcome};
use crate::report::{MergeReporter, TracingReporter};

/// Merges several datagram streams into one time-ordered sequence.
///
/// Single-consumer and pull-based: `next` is the only operation, it may await
/// per-stream I/O, and a session is driven to exhaustion exactly once. Early
/// termination is just dropping the merger.
pub struct StreamMerger {
    streams: Vec<Box<dyn DgramReader>>,
    heads: Vec<StreamDgram>,
    comparator: DgramComparator,
    config: MergeConfig,
    reporter: Arc<dyn MergeReporter>,
}

impl StreamMerger {
    /// Builds a merge session over the given per-stream readers, priming one
    /// head per stream, with advisories going to `tracing`.
    pub async fn new(
        streams: Vec<Box<dyn DgramReader>>,
        config: MergeConfig,
        offsets: Option<Arc<ExperimentClockOffsetTable>>,
    ) -> Result<Self, MergeError> {
        Self::with_reporter(streams, config, offsets, Arc::new(TracingReporter)).await
    }

    /// Builds a merge session with an explicit advisory reporter.
    pub async fn with_reporter(
        streams: Vec<Box<dyn DgramReader>>,
        config: MergeConfig,
        offsets: Option<Arc<ExperimentClockOffsetTable>>,
        reporter: Arc<dyn MergeReporter>,
    ) -> Result<Self, MergeError> {
        let comparator = DgramComparator::new(config.max_clock_drift, offsets, reporter.clone());
        let mut merger = Self {
            heads: vec![StreamDgram::Empty; streams.len()],
            streams,
            comparator,
            config,
            reporter,
        };
        for index in 0..merger.streams.len() {
            merger.refill(index).await?;
        }
        Ok(merger)
    }

    /// Number of input streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// The comparator ranking this session's heads.
    pub fn comparator(&self) -> &DgramComparator {
        &self.comparator
    }

    /// Emits the next globally-earliest datagram, time-corrected, or `None`
    /// once every stream is exhausted.
    pub async fn next(&mut self) -> Result<Option<Datagram>, MergeError> {
        let Some(winner) = self.select()? else {
            return Ok(None);
        };
        let mut dgram = match std::mem::take(&mut self.heads[winner]) {
            StreamDgram::Populated(dgram) => dgram,
            // select only yields populated heads
            StreamDgram::Empty => return Ok(None),
        };
        if !self.config.time_offset.is_zero() {
            dgram.clock = self.config.time_offset.apply(dgram.clock);
        }
        self.refill(winner).await?;
        Ok(Some(dgram))
    }

    /// Adapts the driver into a lazy, finite, single-pass stream. The stream
    /// ends after exhaustion or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Datagram, MergeError>> {
        try_stream! {
            let mut merger = self;
            while let Some(dgram) = merger.next().await? {
                yield dgram;
            }
        }
    }

    /// Index of the minimal populated head, ties to the lowest stream index.
    fn select(&self) -> Result<Option<usize>, MergeError> {
        let mut best: Option<usize> = None;
        for (index, head) in self.heads.iter().enumerate() {
            if head.is_empty() {
                continue;
            }
            best = match best {
                None => Some(index),
                Some(current) => {
                    if self.comparator.is_after(&self.heads[current], head)? {
                        Some(index)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        Ok(best)
    }

    /// Replaces a stream's head with its next readable record, applying the
    /// damaged-record policy and the datagram size bound.
    async fn refill(&mut self, index: usize) -> Result<(), MergeError> {
        loop {
            match self.streams[index].read().await? {
                ReadOutcome::Dgram(dgram) => {
                    if dgram.payload.len() > self.config.max_dgram_size {
                        let reason = DamageReason::Oversized {
                            len: dgram.payload.len(),
                            max: self.config.max_dgram_size,
                        };
                        if self.config.skip_damaged {
                            self.reporter.damaged_skipped(index, &reason);
                            continue;
                        }
                        return Err(MergeError::DamagedRecord {
                            stream: index,
                            reason,
                        });
                    }
                    self.heads[index] = StreamDgram::Populated(dgram);
                    return Ok(());
                }
                ReadOutcome::Damaged(reason) => {
                    if self.config.skip_damaged {
                        self.reporter.damaged_skipped(index, &reason);
                        continue;
                    }
                    return Err(MergeError::DamagedRecord {
                        stream: index,
                        reason,
                    });
                }
                ReadOutcome::EndOfStream => {
                    self.heads[index] = StreamDgram::Empty;
                    return Ok(());
                }
            }
        }
    }
}
