//! Progress reporting for a foreground indexing run
//!
//! Backed by `indicatif` with the `progress` feature, a no-op otherwise.

use crate::index::run::IndexRun;
use std::time::Duration;

/// How often the CLI samples the run's counters
const POLL_INTERVAL: Duration = Duration::from_millis(80);

#[cfg(feature = "progress")]
pub struct RunProgress {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "progress")]
impl RunProgress {
    pub fn new(total: usize) -> Self {
        use indicatif::{ProgressBar, ProgressStyle};

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░  "));
        }
        bar.set_message("Importing files...");
        Self { bar }
    }

    pub fn set_done(&self, done: usize) {
        self.bar.set_position(done as u64);
    }

    pub fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

#[cfg(not(feature = "progress"))]
pub struct RunProgress;

#[cfg(not(feature = "progress"))]
impl RunProgress {
    pub fn new(_total: usize) -> Self {
        RunProgress
    }

    pub fn set_done(&self, _done: usize) {}

    pub fn finish(&self, _msg: String) {}
}

/// Block until `run` ends, updating a progress bar; false if it ended unfinished
pub fn follow_run(run: &IndexRun, silent: bool) -> bool {
    let progress = (!silent).then(|| RunProgress::new(run.state().files_total()));

    while !run.wait(POLL_INTERVAL) {
        if let Some(p) = &progress {
            p.set_done(run.state().files_done());
        }
    }

    let status = run.status();
    if let Some(p) = &progress {
        p.set_done(status.files_done);
        p.finish(format!(
            "Indexed {} paths in {:.1} ms",
            status.files_done,
            status.elapsed_ms.unwrap_or_default()
        ));
    }

    status.finished
}
