//! End-to-end tests driving the engine against real directory trees.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use subdex::engine::Engine;
use subdex::index::{Dictionary, IndexConfig, Location};
use subdex::IndexError;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(60);

const WORDS: &[&str] = &[
    "alphabetical",
    "gammaradiation",
    "deltafunctions",
    "epsilon",
    "beta",
    "zeta",
    "lambdacalculus",
    "omegapoint",
    "x",
    "hello",
    "world",
];

const TERMS: &[&str] = &[
    "alph", "lpha", "alpha", "beta", "gamm", "amma", "gamma", "delt", "elta", "delta", "silo",
    "epsi", "zeta", "lamb", "calc", "ulus", "omeg", "poin", "hell", "ello", "worl", "orld",
];

fn config(workers: usize) -> IndexConfig {
    IndexConfig {
        workers,
        ..IndexConfig::default()
    }
}

/// Deterministic pseudo-random text spread over `files` files
fn write_corpus(root: &Path, files: usize, lines: usize) {
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for f in 0..files {
        let dir = root.join(format!("dir{}", f % 4));
        fs::create_dir_all(&dir).unwrap();

        let mut text = String::new();
        for _ in 0..lines {
            let words = (next() % 8) as usize;
            let line: Vec<&str> = (0..words)
                .map(|_| WORDS[(next() % WORDS.len() as u64) as usize])
                .collect();
            text.push_str(&line.join(" "));
            text.push('\n');
        }
        fs::write(dir.join(format!("file{:03}.txt", f)), text).unwrap();
    }
}

fn index_to_completion(root: &Path, terms: &[&str], config: IndexConfig) -> Engine {
    let engine = Engine::new(Dictionary::from_terms(terms), config);
    engine.start_indexing(root).unwrap();
    assert!(engine.wait_for_completion(TIMEOUT));
    assert!(engine.is_indexing_complete());
    engine
}

/// Every `path:line` whose line contains `q`, by brute force over the tree
fn expected_matches(root: &Path, q: &str, within_word: bool) -> Vec<String> {
    let mut out = Vec::new();
    for entry in walk(root) {
        let rel = entry
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let text = fs::read_to_string(&entry).unwrap();
        for (i, line) in text.lines().enumerate() {
            let hit = if within_word {
                line.split_whitespace().any(|w| w.contains(q))
            } else {
                line.contains(q)
            };
            if hit {
                out.push(format!("{}:{}", rel, i + 1));
            }
        }
    }
    out.sort();
    out
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(walk(&path));
        } else {
            files.push(path);
        }
    }
    files
}

#[test]
fn test_single_file_scenario() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "hello world\n").unwrap();

    let engine = index_to_completion(dir.path(), &["hell", "worl", "ello"], config(20));

    assert_eq!(engine.query("hell").results, vec!["a.txt:1"]);
    assert_eq!(engine.query("wor").results, vec!["a.txt:1"]);
    assert!(engine.query("xyz").results.is_empty());

    // Indexed query that is not a dictionary term
    assert!(engine.query("hello").results.is_empty());

    let status = engine.status();
    assert!(status.finished);
    assert_eq!(status.files_total, 1);
    assert_eq!(status.files_done, 1);
    assert_eq!(status.lines_cached, 1);
}

#[test]
fn test_worker_count_does_not_change_result() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path(), 24, 50);

    let one = index_to_completion(dir.path(), TERMS, config(1));
    let many = index_to_completion(dir.path(), TERMS, config(20));

    let run_one = one.current_run().unwrap();
    let run_many = many.current_run().unwrap();

    assert_eq!(run_one.index().snapshot(), run_many.index().snapshot());

    let lines = |engine: &Engine| -> BTreeMap<u32, Vec<String>> {
        let run = engine.current_run().unwrap();
        run.line_cache()
            .segments()
            .into_iter()
            .map(|(id, seg)| (id, seg.snapshot()))
            .collect()
    };
    assert_eq!(lines(&one), lines(&many));

    for q in ["alph", "gamma", "zeta", "x", "al", "ta g"] {
        assert_eq!(one.query(q), many.query(q), "query {:?}", q);
    }
}

#[test]
fn test_lookup_matches_brute_force() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path(), 12, 40);

    let engine = index_to_completion(dir.path(), TERMS, config(8));

    for term in TERMS {
        assert_eq!(
            engine.query(term).results,
            expected_matches(dir.path(), term, true),
            "term {:?}",
            term
        );
    }
}

#[test]
fn test_scan_matches_brute_force() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path(), 12, 40);

    let engine = index_to_completion(dir.path(), TERMS, config(8));

    // Shorter than min_substr_len, so these cross word boundaries too
    for q in ["a", "ta", "a g", "lon"] {
        assert_eq!(
            engine.query(q).results,
            expected_matches(dir.path(), q, false),
            "query {:?}",
            q
        );
    }
}

#[test]
fn test_every_location_indexed_once() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path(), 8, 30);

    let engine = index_to_completion(dir.path(), TERMS, config(4));
    let run = engine.current_run().unwrap();

    for (_, locations) in run.index().snapshot() {
        let mut sorted: Vec<Location> = locations.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(locations, sorted);
    }
}

#[test]
fn test_lines_cached_verbatim() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("crlf.txt"), "first line\r\nsecond\r\n").unwrap();
    fs::write(dir.path().join("partial.txt"), "no trailing newline").unwrap();
    fs::write(dir.path().join("empty.txt"), "").unwrap();
    fs::write(dir.path().join("blank.txt"), "\n\n  \n").unwrap();
    fs::write(dir.path().join("binary.txt"), b"\xffab cd\n").unwrap();

    let engine = index_to_completion(dir.path(), &[], config(3));
    let run = engine.current_run().unwrap();
    let paths = run.paths();
    let lines = |name: &str| {
        let id = paths.id_of(name).unwrap();
        run.line_cache().file(id).unwrap().snapshot()
    };

    assert_eq!(lines("crlf.txt"), vec!["first line", "second"]);
    assert_eq!(lines("partial.txt"), vec!["no trailing newline"]);
    assert!(lines("empty.txt").is_empty());
    assert_eq!(lines("blank.txt"), vec!["", "", "  "]);
    assert_eq!(lines("binary.txt"), vec!["\u{FFFD}ab cd"]);

    // Blank lines are still scanned
    assert_eq!(engine.query("  ").results, vec!["blank.txt:3"]);
}

#[test]
fn test_directories_counted_but_empty() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("one/two")).unwrap();
    fs::write(dir.path().join("one/two/deep.txt"), "hello\n").unwrap();

    let engine = index_to_completion(dir.path(), &["hell"], config(2));
    let status = engine.status();

    assert_eq!(status.files_total, 3);
    assert_eq!(status.files_done, 3);
    assert_eq!(status.files_failed, 0);
    assert_eq!(engine.query("hell").results, vec!["one/two/deep.txt:1"]);
}

#[cfg(unix)]
#[test]
fn test_unreadable_path_does_not_stall() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("good.txt"), "hello\n").unwrap();
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();

    let engine = index_to_completion(dir.path(), &["hell"], config(2));
    let status = engine.status();

    assert_eq!(status.files_total, 2);
    assert_eq!(status.files_done, 2);
    assert_eq!(status.files_failed, 1);
    assert_eq!(engine.query("hell").results, vec!["good.txt:1"]);
}

#[test]
fn test_missing_root_rejected() {
    let engine = Engine::new(Dictionary::from_terms(["hell"]), config(2));
    let err = engine.start_indexing(Path::new("/nonexistent/subdex/root")).unwrap_err();

    assert!(matches!(err, IndexError::DirectoryUnavailable { .. }));
    assert!(!engine.is_indexing_complete());
}

/// Large enough that a single worker is still busy when the test inspects it
fn slow_engine(dir: &TempDir) -> Engine {
    write_corpus(dir.path(), 400, 200);
    Engine::new(
        Dictionary::from_terms(TERMS),
        IndexConfig {
            workers: 1,
            ingest_queue_capacity: 1,
            job_queue_capacity: 1,
            ..IndexConfig::default()
        },
    )
}

#[test]
fn test_concurrent_start_rejected() {
    let dir = TempDir::new().unwrap();
    let engine = slow_engine(&dir);

    let first = engine.start_indexing(dir.path()).unwrap();
    assert!(!engine.is_indexing_complete());

    let err = engine.start_indexing(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::ConcurrentIndexConflict));

    // The rejected call leaves the current run in place
    assert_eq!(engine.current_run().unwrap().generation(), first.generation);

    engine.cancel_indexing();
    assert!(engine.wait_for_completion(TIMEOUT));
}

#[test]
fn test_queries_answered_mid_run() {
    let dir = TempDir::new().unwrap();
    let engine = slow_engine(&dir);

    engine.start_indexing(dir.path()).unwrap();
    let partial = engine.query("alpha");
    assert!(partial.success);

    assert!(engine.wait_for_completion(TIMEOUT));
    let full = engine.query("alpha");
    assert!(full.results.len() >= partial.results.len());
    assert_eq!(full.results, expected_matches(dir.path(), "alpha", true));
}

#[test]
fn test_cancel_then_restart() {
    let dir = TempDir::new().unwrap();
    let engine = slow_engine(&dir);

    let first = engine.start_indexing(dir.path()).unwrap();
    assert!(engine.cancel_indexing());
    assert!(engine.wait_for_completion(TIMEOUT));

    // Every path still reports, but the index is not complete
    let status = engine.status();
    assert!(status.cancelled);
    assert!(!status.finished);
    assert!(!status.running);
    assert!(status.files_skipped > 0);
    assert_eq!(status.files_done, status.files_total);
    assert!(!engine.is_indexing_complete());
    assert!(!engine.cancel_indexing());

    let second = engine.start_indexing(dir.path()).unwrap();
    assert_eq!(second.generation, first.generation + 1);
    assert!(engine.wait_for_completion(TIMEOUT));

    let status = engine.status();
    assert!(!status.cancelled);
    assert!(status.finished);
    assert_eq!(status.files_skipped, 0);
    assert!(engine.is_indexing_complete());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_file_name_indexed() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"caf\xe9.txt")), "hello world\n").unwrap();
    fs::write(dir.path().join("ok.txt"), "hello\n").unwrap();

    let engine = index_to_completion(dir.path(), &["hell"], config(2));
    let status = engine.status();

    assert_eq!(status.files_failed, 0);
    assert_eq!(status.lines_cached, 2);
    assert_eq!(
        engine.query("hell").results,
        vec!["caf\u{FFFD}.txt:1", "ok.txt:1"]
    );
    assert_eq!(engine.query("wor").results, vec!["caf\u{FFFD}.txt:1"]);
}
