//! Performance benchmarks for subdex
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use subdex::engine::Engine;
use subdex::index::{Dictionary, IndexConfig};
use tempfile::TempDir;

const TERMS: &[&str] = &[
    "func", "unct", "tion", "function", "prin", "rint", "Hell", "ello", "Struct", "ruct", "field",
    "name", "test", "self", "Self",
];

/// Create a test directory with sample files for benchmarking
fn create_benchmark_fixtures() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root_path = temp_dir.path().to_path_buf();

    // Create multiple test files of varying sizes
    for i in 0..200 {
        let content = format!(
            r#"// File {i}
fn function_{i}() {{
    println!("Hello from function {i}");
    let x = {i} * 2;
    let y = x + 1;
}}

struct Struct{i} {{
    field: i32,
    name: String,
}}

impl Struct{i} {{
    fn new() -> Self {{
        Self {{ field: {i}, name: "test".to_string() }}
    }}
}}
"#,
            i = i
        );
        let dir = root_path.join(format!("mod_{}", i % 8));
        fs::create_dir_all(&dir).expect("Failed to create dir");
        fs::write(dir.join(format!("file_{}.rs", i)), content).expect("Failed to write file");
    }

    (temp_dir, root_path)
}

fn index_engine(root: &PathBuf, workers: usize) -> Engine {
    let config = IndexConfig {
        workers,
        ..IndexConfig::default()
    };
    let engine = Engine::new(Dictionary::from_terms(TERMS), config);
    engine.start_indexing(root).expect("Failed to start indexing");
    assert!(engine.wait_for_completion(Duration::from_secs(60)));
    engine
}

fn bench_substrings(c: &mut Criterion) {
    let words = ["fn", "function_42", "println!(\"Hello", "a_rather_long_identifier_name"];

    let mut group = c.benchmark_group("substrings");
    for word in words {
        group.bench_with_input(BenchmarkId::from_parameter(word), &word, |b, &w| {
            b.iter(|| subdex::utils::substrings(black_box(w), 4).count())
        });
    }
    group.finish();
}

fn bench_indexing(c: &mut Criterion) {
    let (_temp_dir, root_path) = create_benchmark_fixtures();

    let mut group = c.benchmark_group("indexing");
    group.sample_size(10);
    for workers in [1, 4, 20] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &w| {
            b.iter(|| index_engine(black_box(&root_path), w))
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let (_temp_dir, root_path) = create_benchmark_fixtures();
    let engine = index_engine(&root_path, 4);

    let mut group = c.benchmark_group("query");

    // Dictionary lookup
    group.bench_function("lookup", |b| b.iter(|| engine.query(black_box("function"))));

    // Below the minimum length: scans every cached line
    group.bench_function("linear_scan", |b| b.iter(|| engine.query(black_box("fn"))));

    // Indexed length but not a dictionary term
    group.bench_function("miss", |b| b.iter(|| engine.query(black_box("zzzz"))));

    group.finish();
}

criterion_group!(benches, bench_substrings, bench_indexing, bench_query);
criterion_main!(benches);
