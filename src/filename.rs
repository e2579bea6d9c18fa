//! Chunk file names and name-derived stream grouping.
//!
//! Apparatus files are named `e<experiment>-r<run>-s<stream>-c<chunk>.<ext>`,
//! e.g. `e665-r0304-s01-c00.dat`. The name carries all the provenance the
//! merge needs: experiment and run number for the comparator, stream and chunk
//! number for grouping files into logical streams.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CHUNK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^e(\d+)-r(\d+)-s(\d+)-c(\d+)$").expect("chunk name pattern"));

/// A chunk file path with the provenance fields parsed out of its name.
///
/// Paths whose names do not follow the apparatus convention parse with all
/// provenance fields zero rather than failing; only the cross-experiment
/// comparison turns a zero experiment number into an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkFileName {
    path: PathBuf,
    experiment: u32,
    run: u32,
    stream: u16,
    chunk: u16,
}

impl ChunkFileName {
    /// Wraps a path, parsing provenance from its file stem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        match CHUNK_NAME.captures(stem) {
            Some(caps) => Self {
                experiment: caps[1].parse().unwrap_or(0),
                run: caps[2].parse().unwrap_or(0),
                stream: caps[3].parse().unwrap_or(0),
                chunk: caps[4].parse().unwrap_or(0),
                path,
            },
            None => Self {
                path,
                ..Self::default()
            },
        }
    }

    /// Builds a name from explicit provenance, synthesizing the conventional
    /// path. Mostly useful for tests and for embedders whose records do not
    /// come from files.
    pub fn from_parts(experiment: u32, run: u32, stream: u16, chunk: u16) -> Self {
        Self {
            path: PathBuf::from(format!(
                "e{experiment}-r{run:04}-s{stream:02}-c{chunk:02}.dat"
            )),
            experiment,
            run,
            stream,
            chunk,
        }
    }

    /// The underlying path.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Experiment identifier; zero when the name carried none.
    #[inline]
    pub fn experiment(&self) -> u32 {
        self.experiment
    }

    /// Run number; zero when the name carried none.
    #[inline]
    pub fn run(&self) -> u32 {
        self.run
    }

    /// Stream number within the apparatus.
    #[inline]
    pub fn stream(&self) -> u16 {
        self.stream
    }

    /// Chunk sequence number within the stream.
    #[inline]
    pub fn chunk(&self) -> u16 {
        self.chunk
    }
}

// Chunk files sort by provenance, not by path, so that grouped chunks come out
// in continuation order.
impl Ord for ChunkFileName {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.experiment, self.run, self.stream, self.chunk, &self.path).cmp(&(
            other.experiment,
            other.run,
            other.stream,
            other.chunk,
            &other.path,
        ))
    }
}

impl PartialOrd for ChunkFileName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ChunkFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Partitions chunk files by the stream number in their names, each group in
/// continuation order. This is the grouping behind the name-derived merge
/// mode.
pub fn group_by_stream(files: Vec<ChunkFileName>) -> BTreeMap<u16, Vec<ChunkFileName>> {
    let mut groups: BTreeMap<u16, Vec<ChunkFileName>> = BTreeMap::new();
    for file in files {
        groups.entry(file.stream()).or_default().push(file);
    }
    for group in groups.values_mut() {
        group.sort();
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conventional_names() {
        let f = ChunkFileName::new("/data/e665-r0304-s01-c02.dat");
        assert_eq!(f.experiment(), 665);
        assert_eq!(f.run(), 304);
        assert_eq!(f.stream(), 1);
        assert_eq!(f.chunk(), 2);
        assert_eq!(f.path(), Path::new("/data/e665-r0304-s01-c02.dat"));
    }

    #[test]
    fn tolerates_unconventional_names() {
        let f = ChunkFileName::new("/data/calibration-notes.txt");
        assert_eq!(f.experiment(), 0);
        assert_eq!(f.run(), 0);
        assert_eq!(f.stream(), 0);
        assert_eq!(f.chunk(), 0);
    }

    #[test]
    fn from_parts_round_trips_through_parse() {
        let made = ChunkFileName::from_parts(12, 7, 80, 3);
        let parsed = ChunkFileName::new(made.path());
        assert_eq!(made, parsed);
    }

    #[test]
    fn orders_by_provenance() {
        let early = ChunkFileName::from_parts(1, 2, 0, 0);
        let late_chunk = ChunkFileName::from_parts(1, 2, 0, 1);
        let late_run = ChunkFileName::from_parts(1, 3, 0, 0);
        assert!(early < late_chunk);
        assert!(late_chunk < late_run);
    }

    #[test]
    fn groups_by_stream_in_chunk_order() {
        let files = vec![
            ChunkFileName::from_parts(1, 5, 1, 1),
            ChunkFileName::from_parts(1, 5, 0, 0),
            ChunkFileName::from_parts(1, 5, 1, 0),
            ChunkFileName::from_parts(1, 5, 80, 0),
        ];
        let groups = group_by_stream(files);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&1].iter().map(|f| f.chunk()).collect::<Vec<_>>(), [0, 1]);
        assert!(groups.contains_key(&0));
        assert!(groups.contains_key(&80));
    }
}
