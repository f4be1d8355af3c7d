//! The four operations exposed to a boundary layer
//!
//! [`Engine`] holds the dictionary, the run configuration and the current
//! [`IndexRun`]. Starting a run swaps in a fresh run object; queries always
//! read whichever run is current and never wait on indexing.

use crate::error::{IndexError, Result};
use crate::index::dictionary::Dictionary;
use crate::index::run::IndexRun;
use crate::index::types::{IndexConfig, IndexStatus};
use crate::query::{QueryExecutor, QueryResult};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Summary of an accepted `start_indexing` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRun {
    pub generation: u64,
    pub files_total: usize,
}

pub struct Engine {
    dictionary: Arc<Dictionary>,
    config: IndexConfig,
    /// Why the engine came up degraded, reported by the health check
    startup_error: Option<String>,
    current: RwLock<Option<Arc<IndexRun>>>,
    generation: AtomicU64,
    start_lock: Mutex<()>,
}

impl Engine {
    pub fn new(dictionary: Dictionary, config: IndexConfig) -> Self {
        Self {
            dictionary: Arc::new(dictionary),
            config: config.normalized(),
            startup_error: None,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            start_lock: Mutex::new(()),
        }
    }

    /// Load the dictionary from disk; a failure leaves the engine up but unhealthy
    pub fn with_dictionary_file(path: &Path, config: IndexConfig) -> Self {
        match Dictionary::load(path) {
            Ok(dict) => Self::new(dict, config),
            Err(e) => {
                log::error!("{}", e);
                let mut engine = Self::new(Dictionary::new(), config);
                engine.startup_error = Some(e.to_string());
                engine
            }
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// The run queries are currently answered from
    pub fn current_run(&self) -> Option<Arc<IndexRun>> {
        self.current.read().unwrap().clone()
    }

    /// Begin a fresh run rooted at `root`
    ///
    /// Rejected while the current run is still in progress.
    pub fn start_indexing(&self, root: &Path) -> Result<StartedRun> {
        let _guard = self.start_lock.lock().unwrap();

        if self.current_run().is_some_and(|run| run.is_running()) {
            return Err(IndexError::ConcurrentIndexConflict);
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let run = IndexRun::start(root, Arc::clone(&self.dictionary), &self.config, generation)?;
        let started = StartedRun {
            generation,
            files_total: run.state().files_total(),
        };

        *self.current.write().unwrap() = Some(run);
        Ok(started)
    }

    /// False before any run and while the current run is in flight
    pub fn is_indexing_complete(&self) -> bool {
        self.current_run().is_some_and(|run| run.is_finished())
    }

    pub fn query(&self, q: &str) -> QueryResult {
        let results = match self.current_run() {
            Some(run) => self.query_run(&run, q),
            None => Vec::new(),
        };

        QueryResult {
            success: true,
            results,
        }
    }

    /// Query a specific run, for callers that already hold one
    pub fn query_run(&self, run: &IndexRun, q: &str) -> Vec<String> {
        QueryExecutor::new(run, &self.dictionary, self.config.min_substr_len).execute(q)
    }

    pub fn health_check(&self) -> bool {
        self.startup_error.is_none()
    }

    pub fn startup_error(&self) -> Option<&str> {
        self.startup_error.as_deref()
    }

    pub fn status(&self) -> IndexStatus {
        self.current_run()
            .map(|run| run.status())
            .unwrap_or_default()
    }

    /// Ask the current run to skip its remaining files; false if nothing is running
    pub fn cancel_indexing(&self) -> bool {
        match self.current_run() {
            Some(run) if run.is_running() => {
                log::info!("Cancelling index run {}", run.generation());
                run.cancel();
                true
            }
            _ => false,
        }
    }

    /// Block until the current run ends; true if there is none
    pub fn wait_for_completion(&self, timeout: Duration) -> bool {
        match self.current_run() {
            Some(run) => run.wait(timeout),
            None => true,
        }
    }
}
