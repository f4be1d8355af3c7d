//! Import worker pool
//!
//! Each worker pulls path IDs from the job queue, caches the file's lines,
//! and turns every dictionary hit into ingest records for the index writer.
//! Workers never touch the inverted index themselves.

use crate::error::IndexError;
use crate::index::dictionary::Dictionary;
use crate::index::line_cache::LineCache;
use crate::index::monitor::IndexingState;
use crate::index::paths::PathList;
use crate::index::types::{FileOutcome, IngestMessage, Location, PathId, TermId};
use crate::utils::tokenizer::for_each_term;
use crossbeam_channel::{Receiver, Sender};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Read-only inputs shared by all workers of a run
pub struct ImportContext {
    pub paths: Arc<PathList>,
    pub dictionary: Arc<Dictionary>,
    pub line_cache: Arc<LineCache>,
    pub state: Arc<IndexingState>,
    pub min_substr_len: usize,
}

/// Fixed-size pool of import threads
pub struct ImportPool {
    workers: Vec<JoinHandle<()>>,
}

impl ImportPool {
    pub fn spawn(
        ctx: Arc<ImportContext>,
        workers: usize,
        jobs: Receiver<PathId>,
        ingest_tx: Sender<IngestMessage>,
    ) -> std::io::Result<Self> {
        let mut handles = Vec::with_capacity(workers);
        for worker_num in 0..workers.max(1) {
            let ctx = Arc::clone(&ctx);
            let jobs = jobs.clone();
            let ingest_tx = ingest_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("subdex-import-{}", worker_num))
                .spawn(move || worker_loop(&ctx, &jobs, &ingest_tx))?;
            handles.push(handle);
        }
        Ok(Self { workers: handles })
    }

    pub fn join(self) {
        for handle in self.workers {
            if handle.join().is_err() {
                log::error!("Import worker panicked");
            }
        }
    }
}

fn worker_loop(ctx: &ImportContext, jobs: &Receiver<PathId>, ingest_tx: &Sender<IngestMessage>) {
    for path_id in jobs.iter() {
        let outcome = import_file(ctx, path_id, ingest_tx);
        if ingest_tx
            .send(IngestMessage::FileDone { path_id, outcome })
            .is_err()
        {
            log::debug!("Ingest queue closed; worker exiting");
            break;
        }
    }
}

/// Import one path and push its records; the caller reports completion
pub fn import_file(ctx: &ImportContext, path_id: PathId, ingest_tx: &Sender<IngestMessage>) -> FileOutcome {
    if ctx.state.is_cancelled() {
        return FileOutcome::Cancelled;
    }

    let Some(path) = ctx.paths.full_path(path_id) else {
        log::warn!("Unknown path id {}", path_id);
        return FileOutcome::Unreadable;
    };

    let unreadable = |source| {
        log::warn!("{}", IndexError::FileUnreadable { path: path.clone(), source });
        FileOutcome::Unreadable
    };

    match fs::metadata(&path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            log::debug!("Not a regular file, no tokens: {}", path.display());
            return FileOutcome::NotRegular;
        }
        Err(e) => return unreadable(e),
    }

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => return unreadable(e),
    };

    let segment = ctx.line_cache.begin_file(path_id);
    let mut found: BTreeMap<TermId, Vec<Location>> = BTreeMap::new();
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_num: u32 = 0;
    let mut outcome = FileOutcome::Imported;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                outcome = unreadable(e);
                break;
            }
        }

        line_num += 1;
        let text = String::from_utf8_lossy(strip_terminator(&buf)).into_owned();
        let loc = Location::new(path_id, line_num);

        for_each_term(&text, &ctx.dictionary, ctx.min_substr_len, |term_id| {
            let locations = found.entry(term_id).or_default();
            if locations.last() != Some(&loc) {
                locations.push(loc);
            }
        });

        segment.push(text);
    }

    for (term_id, locations) in found {
        if ingest_tx
            .send(IngestMessage::Record { term_id, locations })
            .is_err()
        {
            break;
        }
    }

    outcome
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
