use crate::index::types::{Location, TermId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Term ID -> sorted locations
///
/// Mutated only by the index writer thread. Readers take the read lock, so
/// a lookup sees either none or all of a batch.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: RwLock<FxHashMap<TermId, Vec<Location>>>,
    records_applied: AtomicU64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locations of a term, empty if it was never seen
    pub fn get(&self, term_id: TermId) -> Vec<Location> {
        self.postings
            .read()
            .unwrap()
            .get(&term_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn term_count(&self) -> usize {
        self.postings.read().unwrap().len()
    }

    pub fn records_applied(&self) -> u64 {
        self.records_applied.load(Ordering::Relaxed)
    }

    /// Ordered copy of the whole index
    pub fn snapshot(&self) -> BTreeMap<TermId, Vec<Location>> {
        self.postings
            .read()
            .unwrap()
            .iter()
            .map(|(&id, locs)| (id, locs.clone()))
            .collect()
    }

    /// Apply a batch of records under a single write lock
    pub(crate) fn apply<I>(&self, records: I)
    where
        I: IntoIterator<Item = (TermId, Vec<Location>)>,
    {
        let mut postings = self.postings.write().unwrap();
        let mut applied = 0u64;
        for (term_id, locations) in records {
            merge_sorted(postings.entry(term_id).or_default(), locations);
            applied += 1;
        }
        self.records_applied.fetch_add(applied, Ordering::Relaxed);
    }
}

/// Union `incoming` (sorted) into `list` (sorted), keeping duplicates
fn merge_sorted(list: &mut Vec<Location>, incoming: Vec<Location>) {
    let Some(first) = incoming.first() else {
        return;
    };

    // Files are usually finished in path order, so appending is the common case
    if list.last().is_none_or(|last| last <= first) {
        list.extend(incoming);
        return;
    }

    let at = list.partition_point(|l| l <= first);
    let fits = incoming
        .last()
        .zip(list.get(at))
        .is_none_or(|(last_new, next)| last_new <= next);

    if fits {
        list.splice(at..at, incoming);
    } else {
        list.extend(incoming);
        list.sort_unstable();
    }
}
