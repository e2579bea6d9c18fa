//! Merge session configuration and merge modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dgram::ClockTime;
use crate::error::MergeError;
use crate::filename::{ChunkFileName, group_by_stream};

/// Default upper bound on a single datagram, 16 MiB.
pub const DEFAULT_MAX_DGRAM_SIZE: usize = 16 * 1024 * 1024;

/// Default clock drift tolerance between fiducial-correlated streams.
pub const DEFAULT_MAX_CLOCK_DRIFT_SECONDS: u32 = 90;

/// How input files were grouped into logical streams before the merge.
///
/// The mode only shapes reader construction; once per-stream readers exist it
/// has no influence on comparison or merging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    /// All files continue one chunked stream.
    OneStream,
    /// One file per stream, no chunk continuation.
    NoChunking,
    /// Streams and chunk order derived from file names.
    FileName,
}

impl MergeMode {
    /// Groups chunk files into per-stream file lists according to the mode.
    pub fn group(self, mut files: Vec<ChunkFileName>) -> Vec<Vec<ChunkFileName>> {
        match self {
            Self::OneStream => {
                files.sort();
                vec![files]
            }
            Self::NoChunking => files.into_iter().map(|file| vec![file]).collect(),
            Self::FileName => group_by_stream(files).into_values().collect(),
        }
    }
}

impl FromStr for MergeMode {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OneStream" => Ok(Self::OneStream),
            "NoChunking" => Ok(Self::NoChunking),
            "FileName" => Ok(Self::FileName),
            other => Err(MergeError::InvalidMergeMode(other.to_string())),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneStream => write!(f, "OneStream"),
            Self::NoChunking => write!(f, "NoChunking"),
            Self::FileName => write!(f, "FileName"),
        }
    }
}

/// Signed time correction applied to every emitted datagram.
///
/// Stored as whole seconds plus a nanosecond part carrying the same sign, so
/// a correction of -0.25 s is `(0, -250_000_000)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOffset {
    sec: i64,
    nsec: i32,
}

impl TimeOffset {
    /// Creates an offset from explicit parts.
    pub const fn new(sec: i64, nsec: i32) -> Self {
        Self { sec, nsec }
    }

    /// Creates an offset from fractional seconds, rounding the sub-second
    /// part to whole nanoseconds.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let sec = seconds.trunc() as i64;
        let nsec = ((seconds - seconds.trunc()) * 1e9).round() as i32;
        Self { sec, nsec }
    }

    /// Whether the correction is zero.
    pub const fn is_zero(self) -> bool {
        self.sec == 0 && self.nsec == 0
    }

    /// Applies the correction to a clock, rippling nanosecond overflow in
    /// either direction. A correction that would reach before the epoch
    /// saturates at zero.
    pub fn apply(self, clock: ClockTime) -> ClockTime {
        let mut sec = i64::from(clock.sec) + self.sec;
        let mut nsec = i64::from(clock.nsec) + i64::from(self.nsec);
        if nsec >= 1_000_000_000 {
            nsec -= 1_000_000_000;
            sec += 1;
        } else if nsec < 0 {
            nsec += 1_000_000_000;
            sec -= 1;
        }
        if sec < 0 {
            return ClockTime::new(0, 0);
        }
        ClockTime::new(sec as u32, nsec as u32)
    }
}

/// Configuration for one merge session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Upper bound on a single datagram, enforced by the driver and passed
    /// through to readers that size their buffers from it.
    pub max_dgram_size: usize,
    /// Discard damaged records instead of failing the merge.
    pub skip_damaged: bool,
    /// Maximum tolerated clock drift between fiducial-correlated streams,
    /// in seconds.
    pub max_clock_drift: u32,
    /// Time correction applied to every emitted datagram.
    pub time_offset: TimeOffset,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_dgram_size: DEFAULT_MAX_DGRAM_SIZE,
            skip_damaged: false,
            max_clock_drift: DEFAULT_MAX_CLOCK_DRIFT_SECONDS,
            time_offset: TimeOffset::default(),
        }
    }
}

impl MergeConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the datagram size bound.
    pub fn with_max_dgram_size(mut self, max_dgram_size: usize) -> Self {
        self.max_dgram_size = max_dgram_size;
        self
    }

    /// Sets the damaged-record policy.
    pub fn with_skip_damaged(mut self, skip_damaged: bool) -> Self {
        self.skip_damaged = skip_damaged;
        self
    }

    /// Sets the drift tolerance in seconds.
    pub fn with_max_clock_drift(mut self, seconds: u32) -> Self {
        self.max_clock_drift = seconds;
        self
    }

    /// Sets the emission time correction.
    pub fn with_time_offset(mut self, offset: TimeOffset) -> Self {
        self.time_offset = offset;
        self
    }

    /// Sets the emission time correction from fractional seconds.
    pub fn with_time_offset_secs(self, seconds: f64) -> Self {
        self.with_time_offset(TimeOffset::from_secs_f64(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_mode_parses_and_displays() {
        for mode in [MergeMode::OneStream, MergeMode::NoChunking, MergeMode::FileName] {
            assert_eq!(mode.to_string().parse::<MergeMode>().unwrap(), mode);
        }
        let err = "Shuffled".parse::<MergeMode>().unwrap_err();
        assert!(matches!(err, MergeError::InvalidMergeMode(s) if s == "Shuffled"));
    }

    #[test]
    fn one_stream_mode_keeps_everything_together() {
        let files = vec![
            ChunkFileName::from_parts(1, 5, 0, 1),
            ChunkFileName::from_parts(1, 5, 0, 0),
        ];
        let groups = MergeMode::OneStream.group(files);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].iter().map(|f| f.chunk()).collect::<Vec<_>>(), [0, 1]);
    }

    #[test]
    fn no_chunking_mode_gives_each_file_a_stream() {
        let files = vec![
            ChunkFileName::from_parts(1, 5, 0, 0),
            ChunkFileName::from_parts(1, 5, 1, 0),
        ];
        assert_eq!(MergeMode::NoChunking.group(files).len(), 2);
    }

    #[test]
    fn file_name_mode_groups_by_stream_number() {
        let files = vec![
            ChunkFileName::from_parts(1, 5, 1, 1),
            ChunkFileName::from_parts(1, 5, 0, 0),
            ChunkFileName::from_parts(1, 5, 1, 0),
        ];
        let groups = MergeMode::FileName.group(files);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].iter().map(|f| f.chunk()).collect::<Vec<_>>(), [0, 1]);
    }

    #[test]
    fn offset_from_fractional_seconds() {
        assert_eq!(TimeOffset::from_secs_f64(1.0), TimeOffset::new(1, 0));
        assert_eq!(TimeOffset::from_secs_f64(2.5), TimeOffset::new(2, 500_000_000));
        assert_eq!(TimeOffset::from_secs_f64(-0.25), TimeOffset::new(0, -250_000_000));
        assert!(TimeOffset::from_secs_f64(0.0).is_zero());
    }

    #[test]
    fn apply_ripples_nanosecond_overflow() {
        let offset = TimeOffset::new(0, 500_000_000);
        assert_eq!(
            offset.apply(ClockTime::new(5, 600_000_000)),
            ClockTime::new(6, 100_000_000)
        );
    }

    #[test]
    fn apply_borrows_on_negative_offsets() {
        let offset = TimeOffset::from_secs_f64(-0.5);
        assert_eq!(
            offset.apply(ClockTime::new(5, 250_000_000)),
            ClockTime::new(4, 750_000_000)
        );
    }

    #[test]
    fn apply_saturates_at_the_epoch() {
        let offset = TimeOffset::new(-10, 0);
        assert_eq!(offset.apply(ClockTime::new(3, 0)), ClockTime::new(0, 0));
    }

    #[test]
    fn config_builders_compose() {
        let config = MergeConfig::new()
            .with_skip_damaged(true)
            .with_max_clock_drift(120)
            .with_max_dgram_size(1024)
            .with_time_offset_secs(1.0);
        assert!(config.skip_damaged);
        assert_eq!(config.max_clock_drift, 120);
        assert_eq!(config.max_dgram_size, 1024);
        assert_eq!(config.time_offset, TimeOffset::new(1, 0));
    }
}
