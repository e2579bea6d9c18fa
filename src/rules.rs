//! The fixed mapping from category pairs to comparison strategies.
//!
//! Six categories give 36 ordered pairs but comparison does not depend on
//! order, leaving 21 distinct pairings. All 21 occur when merging apparatus
//! streams and each gets exactly one strategy:
//!
//! * Both sides on the master clock (or both on the same independent clock):
//!   compare clocks directly.
//! * Data events correlated through the shared per-pulse counter: compare
//!   fiducials, tolerating bounded clock drift.
//! * A control-stream data event against a transition: neither clock nor
//!   fiducial is usable on both sides, so correlate through run and block
//!   number.
//! * Streams on unrelated clocks from possibly different experiments: look up
//!   a clock offset in the experiment table.

use std::collections::HashMap;

use crate::category::DgramCategory;
use crate::dgram::{StreamKind, TransitionKind};
use crate::error::MergeError;

/// The four ways two datagrams can be ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareStrategy {
    /// Direct lexicographic clock comparison; both sides share a clock domain.
    Clock,
    /// Shared-fiducial comparison tolerant of bounded clock drift.
    Fiducial,
    /// Run-number then block-number correlation.
    Block,
    /// Clock comparison after a cross-experiment offset adjustment.
    OffsetMap,
}

/// Immutable mapping from unordered category pairs to strategies, built once
/// per merge session and never mutated afterward.
#[derive(Clone, Debug)]
pub struct ComparisonRuleTable {
    table: HashMap<(DgramCategory, DgramCategory), CompareStrategy>,
}

impl ComparisonRuleTable {
    /// Builds the table from the 21 known associations.
    pub fn new() -> Self {
        use CompareStrategy::{Block, Clock, Fiducial, OffsetMap};
        use StreamKind::{IndependentControl, Primary, SyncControl};
        use TransitionKind::{ControlTransition, DataEvent};

        let ld = DgramCategory::new(DataEvent, Primary);
        let lc = DgramCategory::new(DataEvent, SyncControl);
        let li = DgramCategory::new(DataEvent, IndependentControl);
        let td = DgramCategory::new(ControlTransition, Primary);
        let tc = DgramCategory::new(ControlTransition, SyncControl);
        let ti = DgramCategory::new(ControlTransition, IndependentControl);

        let mut table = HashMap::with_capacity(21);

        table.insert((ld, ld), Clock);
        table.insert((ld, lc), Fiducial);
        table.insert((ld, li), Fiducial);
        table.insert((ld, td), Clock);
        table.insert((ld, tc), Clock);
        table.insert((ld, ti), OffsetMap);

        table.insert((lc, lc), Fiducial);
        table.insert((lc, li), Fiducial);
        table.insert((lc, td), Block);
        table.insert((lc, tc), Block);
        table.insert((lc, ti), OffsetMap);

        table.insert((li, li), Clock);
        table.insert((li, td), OffsetMap);
        table.insert((li, tc), OffsetMap);
        table.insert((li, ti), Clock);

        table.insert((td, td), Clock);
        table.insert((td, tc), Clock);
        table.insert((td, ti), OffsetMap);

        table.insert((tc, tc), Clock);
        table.insert((tc, ti), OffsetMap);

        table.insert((ti, ti), Clock);

        Self { table }
    }

    /// Resolves the strategy for a pair of categories, probing both orders.
    ///
    /// Fails with [`MergeError::UnknownComparison`] when neither order is in
    /// the table; for the six known categories that cannot happen, so an
    /// error here means an unmodeled stream kind or a construction bug.
    pub fn lookup(
        &self,
        a: DgramCategory,
        b: DgramCategory,
    ) -> Result<CompareStrategy, MergeError> {
        self.table
            .get(&(a, b))
            .or_else(|| self.table.get(&(b, a)))
            .copied()
            .ok_or(MergeError::UnknownComparison { a, b })
    }

    /// Number of populated associations.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty. It never is after construction.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for ComparisonRuleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_21_associations() {
        assert_eq!(ComparisonRuleTable::new().len(), 21);
    }

    #[test]
    fn every_category_pair_resolves_in_both_orders() {
        let rules = ComparisonRuleTable::new();
        for a in DgramCategory::ALL {
            for b in DgramCategory::ALL {
                let ab = rules.lookup(a, b).expect("covered pair");
                let ba = rules.lookup(b, a).expect("covered pair");
                assert_eq!(ab, ba, "{a} vs {b} must not depend on order");
            }
        }
    }

    #[test]
    fn same_category_pairs_use_their_own_clock_domain() {
        use CompareStrategy::{Clock, Fiducial};
        use StreamKind::{IndependentControl, Primary, SyncControl};
        use TransitionKind::DataEvent;

        let rules = ComparisonRuleTable::new();
        let ld = DgramCategory::new(DataEvent, Primary);
        let lc = DgramCategory::new(DataEvent, SyncControl);
        let li = DgramCategory::new(DataEvent, IndependentControl);

        assert_eq!(rules.lookup(ld, ld).unwrap(), Clock);
        assert_eq!(rules.lookup(lc, lc).unwrap(), Fiducial);
        assert_eq!(rules.lookup(li, li).unwrap(), Clock);
    }

    #[test]
    fn control_data_against_transitions_use_blocks() {
        use StreamKind::{Primary, SyncControl};
        use TransitionKind::{ControlTransition, DataEvent};

        let rules = ComparisonRuleTable::new();
        let lc = DgramCategory::new(DataEvent, SyncControl);
        let td = DgramCategory::new(ControlTransition, Primary);
        let tc = DgramCategory::new(ControlTransition, SyncControl);

        assert_eq!(rules.lookup(lc, td).unwrap(), CompareStrategy::Block);
        assert_eq!(rules.lookup(tc, lc).unwrap(), CompareStrategy::Block);
    }

    #[test]
    fn independent_clock_domains_need_the_offset_table() {
        use StreamKind::{IndependentControl, Primary};
        use TransitionKind::{ControlTransition, DataEvent};

        let rules = ComparisonRuleTable::new();
        let ld = DgramCategory::new(DataEvent, Primary);
        let li = DgramCategory::new(DataEvent, IndependentControl);
        let ti = DgramCategory::new(ControlTransition, IndependentControl);
        let td = DgramCategory::new(ControlTransition, Primary);

        assert_eq!(rules.lookup(ld, ti).unwrap(), CompareStrategy::OffsetMap);
        assert_eq!(rules.lookup(li, td).unwrap(), CompareStrategy::OffsetMap);
    }
}
