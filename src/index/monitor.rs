//! Completion tracking for an indexing run
//!
//! The monitor is a countdown keyed to the number of enumerated paths. It is
//! the only writer of `finished`, which flips exactly once and only when every
//! path was actually imported. A run whose files were skipped by cancellation
//! ends without finishing.

use crate::index::types::{duration_ms, FileOutcome};
use crate::index::writer::FileDone;
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Shared progress and completion flag of one run
#[derive(Debug)]
pub struct IndexingState {
    files_total: usize,
    files_done: AtomicUsize,
    files_failed: AtomicUsize,
    files_skipped: AtomicUsize,
    finished: AtomicBool,
    cancelled: AtomicBool,
    /// Ended without a complete index (cancelled, or a stage died)
    stopped: AtomicBool,
    started_at: Instant,
    elapsed: OnceLock<Duration>,
    ended: Mutex<bool>,
    ended_cv: Condvar,
}

impl IndexingState {
    pub fn new(files_total: usize) -> Self {
        Self {
            files_total,
            files_done: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            started_at: Instant::now(),
            elapsed: OnceLock::new(),
            ended: Mutex::new(false),
            ended_cv: Condvar::new(),
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Still expecting completion signals
    pub fn is_running(&self) -> bool {
        !self.is_finished() && !self.stopped.load(Ordering::Acquire)
    }

    pub fn files_total(&self) -> usize {
        self.files_total
    }

    pub fn files_done(&self) -> usize {
        self.files_done.load(Ordering::Relaxed)
    }

    pub fn files_failed(&self) -> usize {
        self.files_failed.load(Ordering::Relaxed)
    }

    /// Paths reported without being imported because the run was cancelled
    pub fn files_skipped(&self) -> usize {
        self.files_skipped.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed.get().copied()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Block until the run ends, finished or not; false on timeout
    pub fn wait(&self, timeout: Duration) -> bool {
        let ended = self.ended.lock().unwrap();
        let (ended, _) = self
            .ended_cv
            .wait_timeout_while(ended, timeout, |ended| !*ended)
            .unwrap();
        *ended
    }

    fn record(&self, outcome: FileOutcome) -> usize {
        match outcome {
            FileOutcome::Unreadable => {
                self.files_failed.fetch_add(1, Ordering::Relaxed);
            }
            FileOutcome::Cancelled => {
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
            }
            FileOutcome::Imported | FileOutcome::NotRegular => {}
        }
        self.files_done.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn finish(&self) {
        let elapsed = self.started_at.elapsed();
        let _ = self.elapsed.set(elapsed);
        self.finished.store(true, Ordering::Release);
        log::info!(
            "Index finished in {:.1} ms ({} files, {} unreadable)",
            duration_ms(elapsed),
            self.files_total,
            self.files_failed()
        );
        self.notify_ended();
    }

    /// Every path reported but some were skipped
    fn end_cancelled(&self) {
        let elapsed = self.started_at.elapsed();
        let _ = self.elapsed.set(elapsed);
        self.stopped.store(true, Ordering::Release);
        log::info!(
            "Index run cancelled after {:.1} ms ({} of {} files skipped)",
            duration_ms(elapsed),
            self.files_skipped(),
            self.files_total
        );
        self.notify_ended();
    }

    fn abandon(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify_ended();
    }

    fn notify_ended(&self) {
        *self.ended.lock().unwrap() = true;
        self.ended_cv.notify_all();
    }
}

/// Thread counting completion signals for one run
pub struct CompletionMonitor {
    handle: JoinHandle<()>,
}

impl CompletionMonitor {
    pub fn spawn(state: Arc<IndexingState>, done_rx: Receiver<FileDone>) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("subdex-monitor".to_string())
            .spawn(move || run(&state, &done_rx))?;
        Ok(Self { handle })
    }

    pub fn join(self) {
        if self.handle.join().is_err() {
            log::error!("Completion monitor thread panicked");
        }
    }
}

fn run(state: &IndexingState, done_rx: &Receiver<FileDone>) {
    let total = state.files_total();
    let mut reported = 0;

    while reported < total {
        match done_rx.recv() {
            Ok((path_id, outcome)) => {
                log::trace!("Path {} reported {:?}", path_id, outcome);
                reported = state.record(outcome);
            }
            Err(_) => {
                log::error!(
                    "Index pipeline stopped after {}/{} files; run will not finish",
                    reported,
                    total
                );
                state.abandon();
                return;
            }
        }
    }

    if state.files_skipped() > 0 {
        state.end_cancelled();
    } else {
        state.finish();
    }
}
