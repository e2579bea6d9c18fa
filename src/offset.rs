//! Cross-experiment clock offsets.
//!
//! Streams recorded under different experiments run on unrelated clocks. The
//! offset table, populated by the embedding application (typically from
//! calibration data serialized as JSON), lets the comparator translate one
//! side's clock into the other side's domain before comparing.
//!
//! Sign convention: an entry keyed `(x, y)` holding `d` converts a clock read
//! in experiment `x`'s domain into experiment `y`'s domain by adding `d`
//! seconds. Lookup is symmetric and reports which key order matched so the
//! caller knows which side to adjust. When independent-control streams of a
//! single experiment are merged, an identity entry `(e, e)` with offset zero
//! makes the pair resolvable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which key ordering matched during a symmetric lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffsetDirection {
    /// The entry was keyed `(a, b)`: the offset converts `a`'s clock domain.
    Forward,
    /// The entry was keyed `(b, a)`: the offset converts `b`'s clock domain.
    Reverse,
}

/// One serialized offset-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockOffsetEntry {
    /// Experiment whose clock domain the offset converts from.
    pub from: u32,
    /// Experiment whose clock domain the offset converts into.
    pub to: u32,
    /// Offset in seconds, added to a `from`-domain clock.
    pub seconds: f64,
}

/// Read-only table of clock offsets between experiment pairs.
///
/// Built once before the merge session and shared by reference for its whole
/// lifetime. Serializes as a flat list of [`ClockOffsetEntry`] values.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ClockOffsetEntry>", into = "Vec<ClockOffsetEntry>")]
pub struct ExperimentClockOffsetTable {
    offsets: HashMap<(u32, u32), f64>,
}

impl ExperimentClockOffsetTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the offset converting `from`-domain clocks into `to`-domain
    /// clocks. A later insert for the same ordered pair replaces the earlier
    /// one.
    pub fn insert(&mut self, from: u32, to: u32, seconds: f64) {
        self.offsets.insert((from, to), seconds);
    }

    /// Resolves the offset between two experiments, probing `(a, b)` first
    /// and `(b, a)` second, and reporting which order matched.
    pub fn lookup(&self, a: u32, b: u32) -> Option<(f64, OffsetDirection)> {
        if let Some(&seconds) = self.offsets.get(&(a, b)) {
            return Some((seconds, OffsetDirection::Forward));
        }
        self.offsets
            .get(&(b, a))
            .map(|&seconds| (seconds, OffsetDirection::Reverse))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl From<Vec<ClockOffsetEntry>> for ExperimentClockOffsetTable {
    fn from(entries: Vec<ClockOffsetEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.from, entry.to, entry.seconds);
        }
        table
    }
}

impl From<ExperimentClockOffsetTable> for Vec<ClockOffsetEntry> {
    fn from(table: ExperimentClockOffsetTable) -> Self {
        let mut entries: Self = table
            .offsets
            .into_iter()
            .map(|((from, to), seconds)| ClockOffsetEntry { from, to, seconds })
            .collect();
        entries.sort_by_key(|e| (e.from, e.to));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_probes_both_orders() {
        let mut table = ExperimentClockOffsetTable::new();
        table.insert(665, 666, 12.5);

        assert_eq!(table.lookup(665, 666), Some((12.5, OffsetDirection::Forward)));
        assert_eq!(table.lookup(666, 665), Some((12.5, OffsetDirection::Reverse)));
        assert_eq!(table.lookup(665, 667), None);
    }

    #[test]
    fn later_insert_replaces() {
        let mut table = ExperimentClockOffsetTable::new();
        table.insert(1, 2, 1.0);
        table.insert(1, 2, 2.0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(1, 2), Some((2.0, OffsetDirection::Forward)));
    }

    #[test]
    fn identity_entry_resolves_same_experiment() {
        let mut table = ExperimentClockOffsetTable::new();
        table.insert(9, 9, 0.0);
        assert_eq!(table.lookup(9, 9), Some((0.0, OffsetDirection::Forward)));
    }

    #[test]
    fn serializes_as_entry_list() {
        let mut table = ExperimentClockOffsetTable::new();
        table.insert(1, 2, 0.25);
        table.insert(3, 4, -1.5);

        let json = serde_json::to_string(&table).unwrap();
        let back: ExperimentClockOffsetTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lookup(1, 2), Some((0.25, OffsetDirection::Forward)));
        assert_eq!(back.lookup(4, 3), Some((-1.5, OffsetDirection::Reverse)));
    }
}
