use crate::index::types::PathId;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Lines of a single file, line `n` stored at position `n - 1`
///
/// Each segment has exactly one writer (the worker importing that file), so
/// workers never contend with each other; queries take the read side.
#[derive(Debug, Default)]
pub struct FileLines {
    lines: RwLock<Vec<String>>,
}

impl FileLines {
    pub fn push(&self, line: String) {
        self.lines.write().unwrap().push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Line by 1-based number
    pub fn get(&self, line: u32) -> Option<String> {
        let idx = (line as usize).checked_sub(1)?;
        self.lines.read().unwrap().get(idx).cloned()
    }

    /// 1-based numbers of lines containing `needle`
    pub fn matching_lines(&self, needle: &str) -> Vec<u32> {
        let finder = memchr::memmem::Finder::new(needle.as_bytes());
        self.lines
            .read()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, text)| finder.find(text.as_bytes()).is_some())
            .map(|(i, _)| (i + 1) as u32)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.read().unwrap().clone()
    }
}

/// Shared store of every imported file's lines
#[derive(Debug, Default)]
pub struct LineCache {
    files: RwLock<FxHashMap<PathId, Arc<FileLines>>>,
}

impl LineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or reset) the segment for a file and hand it to its importer
    pub fn begin_file(&self, path_id: PathId) -> Arc<FileLines> {
        let segment = Arc::new(FileLines::default());
        self.files
            .write()
            .unwrap()
            .insert(path_id, Arc::clone(&segment));
        segment
    }

    pub fn file(&self, path_id: PathId) -> Option<Arc<FileLines>> {
        self.files.read().unwrap().get(&path_id).cloned()
    }

    pub fn get(&self, path_id: PathId, line: u32) -> Option<String> {
        self.file(path_id)?.get(line)
    }

    /// All segments present right now, ordered by path ID
    pub fn segments(&self) -> Vec<(PathId, Arc<FileLines>)> {
        let mut segments: Vec<_> = self
            .files
            .read()
            .unwrap()
            .iter()
            .map(|(&id, seg)| (id, Arc::clone(seg)))
            .collect();
        segments.sort_unstable_by_key(|(id, _)| *id);
        segments
    }

    pub fn line_count(&self) -> usize {
        self.segments().iter().map(|(_, seg)| seg.len()).sum()
    }
}
