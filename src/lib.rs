//! # daqmerge
//!
//! Deterministic, time-ordered merging of datagram streams from a
//! multi-stream data-acquisition apparatus.
//!
//! An apparatus records one primary acquisition stream and any number of
//! control-system streams, each on its own clock or trigger domain and each
//! split across size-bounded chunk files. This crate rebuilds the single
//! global event order: a comparator classifies every datagram into one of six
//! categories and picks, per category pair, one of four comparison strategies
//! (direct clock, shared fiducial counter, run/block correlation, or a
//! cross-experiment clock-offset lookup); a pull-based driver k-way merges
//! the streams under that order, applying a uniform time correction and a
//! configurable damaged-record policy.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use daqmerge::config::MergeConfig;
//! use daqmerge::dgram::{ClockTime, Datagram, StreamKind, TransitionKind};
//! use daqmerge::merger::StreamMerger;
//! use daqmerge::reader::{DgramReader, QueueReader};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), daqmerge::error::MergeError> {
//! let primary = QueueReader::from_dgrams([Datagram::new(
//!     TransitionKind::DataEvent,
//!     StreamKind::Primary,
//!     ClockTime::new(0, 0),
//! )]);
//! let readers: Vec<Box<dyn DgramReader>> = vec![Box::new(primary)];
//!
//! let mut merger = StreamMerger::new(readers, MergeConfig::default(), None).await?;
//! while let Some(dgram) = merger.next().await? {
//!     println!("{:?} from {}", dgram.clock, dgram.stream);
//! }
//! # Ok(())
//! # }
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Datagram categories: the six-value classification driving dispatch.
pub mod category;
/// Comparison strategies and the datagram comparator.
pub mod compare;
/// Merge session configuration and merge modes.
pub mod config;
/// Datagram records and the sentinel wrapper.
pub mod dgram;
/// Merge session errors.
pub mod error;
/// Chunk file names and name-derived stream grouping.
pub mod filename;
/// The pull-based merge driver.
pub mod merger;
/// Cross-experiment clock offsets.
pub mod offset;
/// Per-stream datagram readers.
pub mod reader;
/// Advisory reporting for merge sessions.
pub mod report;
/// The fixed category-pair rule table.
pub mod rules;
