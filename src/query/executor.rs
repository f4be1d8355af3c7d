use crate::index::dictionary::Dictionary;
use crate::index::run::IndexRun;
use crate::query::dedup::dedup;
use rayon::prelude::*;

/// Which strategy answers a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPlan {
    /// Too short to have been indexed: scan the cached lines
    LinearScan,
    /// Look the whole query up as a dictionary term
    IndexLookup,
}

impl QueryPlan {
    /// Lengths are in bytes, matching how substrings were enumerated
    pub fn for_query(q: &str, min_substr_len: usize) -> Self {
        if q.len() < min_substr_len {
            QueryPlan::LinearScan
        } else {
            QueryPlan::IndexLookup
        }
    }
}

/// Answers queries against one run, safe to use while the run is in progress
pub struct QueryExecutor<'a> {
    run: &'a IndexRun,
    dictionary: &'a Dictionary,
    min_substr_len: usize,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(run: &'a IndexRun, dictionary: &'a Dictionary, min_substr_len: usize) -> Self {
        Self {
            run,
            dictionary,
            min_substr_len,
        }
    }

    /// Deduplicated, sorted `path:line` results
    pub fn execute(&self, q: &str) -> Vec<String> {
        let results = match QueryPlan::for_query(q, self.min_substr_len) {
            QueryPlan::LinearScan => self.scan_lines(q),
            QueryPlan::IndexLookup => self.lookup(q),
        };
        dedup(results)
    }

    /// Every cached line containing `q` literally (case-sensitive)
    pub fn scan_lines(&self, q: &str) -> Vec<String> {
        let paths = self.run.paths();
        self.run
            .line_cache()
            .segments()
            .par_iter()
            .flat_map_iter(|(path_id, segment)| {
                let path = paths.get(*path_id).unwrap_or_default();
                segment
                    .matching_lines(q)
                    .into_iter()
                    .map(move |line| format!("{}:{}", path, line))
            })
            .collect()
    }

    /// Locations recorded for `q`; unknown terms simply have none
    pub fn lookup(&self, q: &str) -> Vec<String> {
        let Some(term_id) = self.dictionary.get(q) else {
            return Vec::new();
        };

        self.run
            .index()
            .get(term_id)
            .into_iter()
            .filter_map(|loc| self.run.display_location(loc.path_id, loc.line))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::IndexConfig;
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn indexed(files: &[(&str, &str)], terms: &[&str]) -> (TempDir, Arc<IndexRun>, Dictionary) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let dict = Dictionary::from_terms(terms);
        let run = IndexRun::start(dir.path(), Arc::new(dict.clone()), &IndexConfig::default(), 1)
            .unwrap();
        assert!(run.wait(Duration::from_secs(10)));
        (dir, run, dict)
    }

    #[test]
    fn test_plan_boundary() {
        assert_eq!(QueryPlan::for_query("abc", 4), QueryPlan::LinearScan);
        assert_eq!(QueryPlan::for_query("abcd", 4), QueryPlan::IndexLookup);
        assert_eq!(QueryPlan::for_query("", 4), QueryPlan::LinearScan);
    }

    #[test]
    fn test_boundary_uses_different_paths() {
        // "orld" is deliberately not a dictionary term
        let (_dir, run, dict) = indexed(&[("a.txt", "hello world\n")], &["hell"]);
        let exec = QueryExecutor::new(&run, &dict, 4);

        assert_eq!(exec.execute("orl"), vec!["a.txt:1"]);
        assert!(exec.execute("orld").is_empty());
        assert_eq!(exec.scan_lines("orld"), vec!["a.txt:1"]);
    }

    #[test]
    fn test_lookup_deduplicates() {
        let (_dir, run, dict) = indexed(
            &[("a.txt", "hello hello\nhellhound\n"), ("b.txt", "shell\n")],
            &["hell"],
        );
        let exec = QueryExecutor::new(&run, &dict, 4);
        assert_eq!(exec.execute("hell"), vec!["a.txt:1", "a.txt:2", "b.txt:1"]);
    }

    #[test]
    fn test_scan_is_case_sensitive() {
        let (_dir, run, dict) = indexed(&[("a.txt", "Foo\nfoo\n")], &[]);
        let exec = QueryExecutor::new(&run, &dict, 4);
        assert_eq!(exec.execute("foo"), vec!["a.txt:2"]);
        assert_eq!(exec.execute("Fo"), vec!["a.txt:1"]);
    }
}
