//! Comparison strategies and the datagram comparator.
//!
//! [`DgramComparator`] is the ordering oracle behind the merge: given two
//! stream heads it answers the strict question "does `a` rank later than
//! `b`". Sentinels are handled first (they sort after everything and equal to
//! each other); populated pairs are classified, the rule table picks one of
//! the four strategies, and the strategy decides.

use std::sync::Arc;

use crate::category::DgramCategory;
use crate::dgram::{Datagram, StreamDgram, TransitionKind};
use crate::error::MergeError;
use crate::offset::{ExperimentClockOffsetTable, OffsetDirection};
use crate::report::MergeReporter;
use crate::rules::{CompareStrategy, ComparisonRuleTable};

/// Fiducial counter period: a 17-bit per-pulse counter driven at 360 Hz,
/// wrapping at this value roughly every six minutes.
pub const FIDUCIAL_PERIOD: u32 = 0x1ffe0;

/// Wrap-aware fiducial comparison tolerant of bounded clock drift.
///
/// Streams correlated through the shared per-pulse counter carry clocks that
/// may drift apart by a bounded amount. Within that bound the fiducial
/// decides, with wraparound resolved toward the shorter distance; beyond it
/// the clocks have diverged too far for fiducial correlation to mean anything
/// and the clock decides directly.
#[derive(Clone, Copy, Debug)]
pub struct FiducialCompare {
    max_clock_drift: u32,
}

impl FiducialCompare {
    /// Creates a comparison with the given drift tolerance in seconds.
    pub const fn new(max_clock_drift: u32) -> Self {
        Self { max_clock_drift }
    }

    /// The drift tolerance in seconds.
    pub const fn max_clock_drift(&self) -> u32 {
        self.max_clock_drift
    }

    /// Strict "a ranks later than b".
    pub fn is_after(&self, a: &Datagram, b: &Datagram) -> bool {
        let skew = a.clock.as_secs_f64() - b.clock.as_secs_f64();
        if skew.abs() > f64::from(self.max_clock_drift) {
            return a.clock > b.clock;
        }
        let distance = wrapped_distance(a.fiducial, b.fiducial);
        // Zero and the exact half-period are ambiguous under wraparound;
        // the clock settles both.
        if distance == 0 || distance == i64::from(FIDUCIAL_PERIOD / 2) {
            a.clock > b.clock
        } else {
            distance > 0
        }
    }
}

/// Signed fiducial distance from `b` to `a`, mapped into
/// `(-PERIOD/2, PERIOD/2]`.
fn wrapped_distance(a: u32, b: u32) -> i64 {
    let period = i64::from(FIDUCIAL_PERIOD);
    let raw = (i64::from(a % FIDUCIAL_PERIOD) - i64::from(b % FIDUCIAL_PERIOD)).rem_euclid(period);
    if raw > period / 2 { raw - period } else { raw }
}

/// Orders datagrams across heterogeneous clock and trigger domains.
///
/// Construction fixes the rule table, the drift tolerance, the offset table
/// and the advisory reporter for the lifetime of the merge session; nothing
/// is mutated by comparisons.
pub struct DgramComparator {
    rules: ComparisonRuleTable,
    fiducials: FiducialCompare,
    offsets: Option<Arc<ExperimentClockOffsetTable>>,
    reporter: Arc<dyn MergeReporter>,
}

impl DgramComparator {
    /// Creates a comparator.
    ///
    /// `offsets` may be `None` when no independent-clock pairings can occur;
    /// if one does occur anyway, the comparison fails with
    /// [`MergeError::NoClockOffset`] rather than guessing.
    pub fn new(
        max_clock_drift: u32,
        offsets: Option<Arc<ExperimentClockOffsetTable>>,
        reporter: Arc<dyn MergeReporter>,
    ) -> Self {
        Self {
            rules: ComparisonRuleTable::new(),
            fiducials: FiducialCompare::new(max_clock_drift),
            offsets,
            reporter,
        }
    }

    /// Categorizes a stream head, raising a diagnostic for sentinels before
    /// returning their defensive default category.
    pub fn category_of(&self, dg: &StreamDgram) -> DgramCategory {
        if dg.is_empty() {
            self.reporter.classify_empty();
        }
        DgramCategory::classify(dg)
    }

    /// Strict "a ranks later than b".
    ///
    /// Sentinels rank after every populated datagram and equal to each other,
    /// so exhausted streams sink to the end of any ranking and stay there.
    pub fn is_after(&self, a: &StreamDgram, b: &StreamDgram) -> Result<bool, MergeError> {
        let (da, db) = match (a, b) {
            (StreamDgram::Empty, StreamDgram::Empty) => return Ok(false),
            (StreamDgram::Empty, StreamDgram::Populated(_)) => return Ok(true),
            (StreamDgram::Populated(_), StreamDgram::Empty) => return Ok(false),
            (StreamDgram::Populated(da), StreamDgram::Populated(db)) => (da, db),
        };

        let cat_a = DgramCategory::classify(a);
        let cat_b = DgramCategory::classify(b);
        match self.rules.lookup(cat_a, cat_b)? {
            CompareStrategy::Clock => Ok(da.clock > db.clock),
            CompareStrategy::Fiducial => Ok(self.fiducials.is_after(da, db)),
            CompareStrategy::Block => self.block_after(da, db, cat_a, cat_b),
            CompareStrategy::OffsetMap => self.offset_after(da, db),
        }
    }

    /// Cross-stream duplicate oracle.
    ///
    /// Only the sentinel cases are defined: two sentinels are the same
    /// (nothing vs. nothing), a sentinel never equals a populated record.
    /// Two populated records fail with
    /// [`MergeError::DuplicatePolicyUndefined`]; equality across streams
    /// needs its own per-category policy and this crate does not infer one.
    pub fn same_event(&self, a: &StreamDgram, b: &StreamDgram) -> Result<bool, MergeError> {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => {
                self.reporter.same_event_on_empty(true);
                Ok(true)
            }
            (true, false) | (false, true) => {
                self.reporter.same_event_on_empty(false);
                Ok(false)
            }
            (false, false) => Err(MergeError::DuplicatePolicyUndefined),
        }
    }

    /// Run-number then block-number correlation.
    ///
    /// Run numbers decide across runs unconditionally; the clocks only get a
    /// vote as an advisory when they contradict the run ordering by more than
    /// the drift tolerance. Within a run the block numbers decide, with an
    /// asymmetric tie so a control-stream data event lands immediately after
    /// the transition that opened its block, never before it.
    fn block_after(
        &self,
        a: &Datagram,
        b: &Datagram,
        cat_a: DgramCategory,
        cat_b: DgramCategory,
    ) -> Result<bool, MergeError> {
        if cat_a.kind == cat_b.kind {
            return Err(MergeError::CategoryTableConflict { a: cat_a, b: cat_b });
        }

        let (run_a, run_b) = (a.run(), b.run());
        let skew = a.clock.as_secs_f64() - b.clock.as_secs_f64();
        let tolerance = self.fiducials.max_clock_drift();

        if run_a < run_b {
            if skew > f64::from(tolerance) {
                self.reporter
                    .clock_contradicts_run_order(run_a, run_b, skew, tolerance);
            }
            return Ok(false);
        }
        if run_a > run_b {
            if skew < -f64::from(tolerance) {
                self.reporter
                    .clock_contradicts_run_order(run_b, run_a, skew, tolerance);
            }
            return Ok(true);
        }

        if cat_a.kind == TransitionKind::DataEvent {
            Ok(a.block >= b.block)
        } else {
            Ok(a.block > b.block)
        }
    }

    /// Clock comparison after translating one side into the other side's
    /// clock domain through the experiment offset table.
    ///
    /// A forward match `(exp_a, exp_b)` converts `a`'s domain, so the offset
    /// is added to `a`'s clock; a reverse match converts `b`'s. The adjusted
    /// fractional-second clocks then compare directly.
    fn offset_after(&self, a: &Datagram, b: &Datagram) -> Result<bool, MergeError> {
        let (exp_a, exp_b) = (a.experiment(), b.experiment());
        if exp_a == 0 || exp_b == 0 {
            return Err(MergeError::NoClockOffset { exp_a, exp_b });
        }
        let (seconds, direction) = self
            .offsets
            .as_deref()
            .and_then(|table| table.lookup(exp_a, exp_b))
            .ok_or(MergeError::NoClockOffset { exp_a, exp_b })?;

        let (clock_a, clock_b) = match direction {
            OffsetDirection::Forward => (a.clock.as_secs_f64() + seconds, b.clock.as_secs_f64()),
            OffsetDirection::Reverse => (a.clock.as_secs_f64(), b.clock.as_secs_f64() + seconds),
        };
        Ok(clock_a > clock_b)
    }
}
