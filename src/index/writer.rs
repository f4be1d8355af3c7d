use crate::index::inverted::InvertedIndex;
use crate::index::types::{FileOutcome, IngestMessage, Location, PathId, TermId};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Upper bound on messages drained before taking the write lock
const MAX_BATCH: usize = 1024;

/// Completion signal forwarded to the monitor once a file's records are applied
pub type FileDone = (PathId, FileOutcome);

/// The single consumer of the ingest queue
///
/// Workers push per-file records followed by that file's `FileDone`; the
/// writer applies records in receipt order and forwards `FileDone` only after
/// everything received before it is visible in the index.
pub struct IndexWriter {
    handle: JoinHandle<()>,
}

impl IndexWriter {
    pub fn spawn(
        index: Arc<InvertedIndex>,
        ingest_rx: Receiver<IngestMessage>,
        done_tx: Sender<FileDone>,
    ) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("subdex-writer".to_string())
            .spawn(move || run(&index, &ingest_rx, &done_tx))?;
        Ok(Self { handle })
    }

    /// Wait until every sender has hung up and the queue is drained
    pub fn join(self) {
        if self.handle.join().is_err() {
            log::error!("Index writer thread panicked");
        }
    }
}

fn run(index: &InvertedIndex, ingest_rx: &Receiver<IngestMessage>, done_tx: &Sender<FileDone>) {
    let mut records = Vec::new();
    let mut done = Vec::new();

    while let Ok(first) = ingest_rx.recv() {
        sort_message(first, &mut records, &mut done);
        while records.len() + done.len() < MAX_BATCH {
            match ingest_rx.try_recv() {
                Ok(msg) => sort_message(msg, &mut records, &mut done),
                Err(_) => break,
            }
        }

        if !records.is_empty() {
            index.apply(records.drain(..));
        }
        for signal in done.drain(..) {
            // Monitor gone means the run was torn down; keep draining so workers never block
            let _ = done_tx.send(signal);
        }
    }
}

fn sort_message(
    msg: IngestMessage,
    records: &mut Vec<(TermId, Vec<Location>)>,
    done: &mut Vec<FileDone>,
) {
    match msg {
        IngestMessage::Record { term_id, locations } => records.push((term_id, locations)),
        IngestMessage::FileDone { path_id, outcome } => done.push((path_id, outcome)),
    }
}
