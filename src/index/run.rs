//! One indexing run and the threads that build it
//!
//! ```text
//! feeder ──jobs──> import workers ──ingest──> index writer ──done──> monitor
//!                        │                         │
//!                        └──> line cache           └──> inverted index
//! ```

use crate::error::Result;
use crate::index::dictionary::Dictionary;
use crate::index::import::{ImportContext, ImportPool};
use crate::index::inverted::InvertedIndex;
use crate::index::line_cache::LineCache;
use crate::index::monitor::{CompletionMonitor, IndexingState};
use crate::index::paths::PathList;
use crate::index::types::{duration_ms, IndexConfig, IndexStatus, PathId};
use crate::index::writer::IndexWriter;
use crossbeam_channel::{bounded, unbounded};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Everything one run owns; replaced wholesale by the next run
pub struct IndexRun {
    generation: u64,
    paths: Arc<PathList>,
    line_cache: Arc<LineCache>,
    index: Arc<InvertedIndex>,
    state: Arc<IndexingState>,
}

impl IndexRun {
    /// Enumerate `root` and start indexing it in the background
    ///
    /// Fails before any thread is started if the root cannot be walked.
    pub fn start(
        root: &Path,
        dictionary: Arc<Dictionary>,
        config: &IndexConfig,
        generation: u64,
    ) -> Result<Arc<Self>> {
        let config = config.clone().normalized();
        let paths = Arc::new(PathList::enumerate(root, config.skip_hidden)?);

        log::info!(
            "Start indexing ({}): {} paths, {} workers",
            paths.root().display(),
            paths.len(),
            config.workers
        );

        let run = Arc::new(Self {
            generation,
            state: Arc::new(IndexingState::new(paths.len())),
            paths,
            line_cache: Arc::new(LineCache::new()),
            index: Arc::new(InvertedIndex::new()),
        });

        run.spawn_pipeline(dictionary, &config)?;
        Ok(run)
    }

    fn spawn_pipeline(&self, dictionary: Arc<Dictionary>, config: &IndexConfig) -> Result<()> {
        let (job_tx, job_rx) = bounded::<PathId>(config.job_queue_capacity);
        let (ingest_tx, ingest_rx) = bounded(config.ingest_queue_capacity);
        let (done_tx, done_rx) = unbounded();

        let monitor = CompletionMonitor::spawn(Arc::clone(&self.state), done_rx)?;
        let writer = IndexWriter::spawn(Arc::clone(&self.index), ingest_rx, done_tx)?;

        let ctx = Arc::new(ImportContext {
            paths: Arc::clone(&self.paths),
            dictionary,
            line_cache: Arc::clone(&self.line_cache),
            state: Arc::clone(&self.state),
            min_substr_len: config.min_substr_len,
        });
        let pool = ImportPool::spawn(ctx, config.workers, job_rx, ingest_tx)?;

        let total = self.paths.len();
        thread::Builder::new()
            .name("subdex-feeder".to_string())
            .spawn(move || {
                for path_id in 0..total {
                    if job_tx.send(path_id as PathId).is_err() {
                        log::error!("All import workers exited early");
                        break;
                    }
                }
                drop(job_tx);

                // Teardown order follows the data flow so every queue drains
                pool.join();
                writer.join();
                monitor.join();
            })?;

        Ok(())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn paths(&self) -> &PathList {
        &self.paths
    }

    pub fn line_cache(&self) -> &LineCache {
        &self.line_cache
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn state(&self) -> &IndexingState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Block until the run ends; false on timeout
    pub fn wait(&self, timeout: Duration) -> bool {
        self.state.wait(timeout)
    }

    /// Render a location as `path:line`
    pub fn display_location(&self, path_id: PathId, line: u32) -> Option<String> {
        self.paths.get(path_id).map(|p| format!("{}:{}", p, line))
    }

    pub fn status(&self) -> IndexStatus {
        IndexStatus {
            finished: self.state.is_finished(),
            running: self.state.is_running(),
            cancelled: self.state.is_cancelled(),
            files_total: self.state.files_total(),
            files_done: self.state.files_done(),
            files_failed: self.state.files_failed(),
            files_skipped: self.state.files_skipped(),
            records_applied: self.index.records_applied(),
            terms_indexed: self.index.term_count(),
            lines_cached: self.line_cache.line_count(),
            elapsed_ms: self.state.elapsed().map(duration_ms),
        }
    }
}
