use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Position of a path in the run's path list
pub type PathId = u32;

/// Dictionary identifier of a term (1-based line number in the dictionary file)
pub type TermId = u32;

/// A (file, line) coordinate where a term occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path_id: PathId,
    /// 1-based line number
    pub line: u32,
}

impl Location {
    pub fn new(path_id: PathId, line: u32) -> Self {
        Self { path_id, line }
    }
}

/// Unit of work sent from an import worker to the index writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestMessage {
    /// All locations of one term within one file, sorted ascending
    Record {
        term_id: TermId,
        locations: Vec<Location>,
    },
    /// The file has been fully processed (read, skipped, or failed)
    FileDone { path_id: PathId, outcome: FileOutcome },
}

/// How a single path ended up after import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Imported,
    /// Directory, socket, or other non-regular entry
    NotRegular,
    Unreadable,
    Cancelled,
}

/// Configuration for one indexing run
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Shortest substring looked up in the dictionary (and shortest indexed query)
    pub min_substr_len: usize,
    /// Number of import workers
    pub workers: usize,
    /// Capacity of the worker -> writer queue
    pub ingest_queue_capacity: usize,
    /// Capacity of the feeder -> worker queue
    pub job_queue_capacity: usize,
    /// Skip dot-files and dot-directories while enumerating
    pub skip_hidden: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_substr_len: 4,
            workers: 20,
            ingest_queue_capacity: 4096,
            job_queue_capacity: 1024,
            skip_hidden: false,
        }
    }
}

impl IndexConfig {
    /// Clamp values that would stall or break a run
    pub fn normalized(mut self) -> Self {
        self.min_substr_len = self.min_substr_len.max(1);
        self.workers = self.workers.max(1);
        self.ingest_queue_capacity = self.ingest_queue_capacity.max(1);
        self.job_queue_capacity = self.job_queue_capacity.max(1);
        self
    }
}

/// Point-in-time view of a run's progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Every path was imported; the index is complete
    pub finished: bool,
    /// Still waiting on completion signals
    pub running: bool,
    pub cancelled: bool,
    pub files_total: usize,
    pub files_done: usize,
    pub files_failed: usize,
    /// Reported without being imported after a cancel
    pub files_skipped: usize,
    pub records_applied: u64,
    pub terms_indexed: usize,
    pub lines_cached: usize,
    pub elapsed_ms: Option<f64>,
}

pub(crate) fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
