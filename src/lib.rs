//! # Subdex - Concurrent Substring Index
//!
//! Subdex indexes a directory tree for substring search. Every line of every
//! file is split into words, each word into all of its substrings of at least
//! `min_substr_len` bytes, and every substring found in a fixed dictionary is
//! recorded against the `(file, line)` it came from.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Path enumeration, the import worker pool, the single index writer
//!   and completion tracking
//! - [`query`] - Linear scan for short queries, index lookup otherwise, then dedup
//! - [`engine`] - The operations a boundary layer calls: start, is-complete, query, health
//! - `server` - Unix-socket daemon and client (`daemon` feature)
//! - [`output`] - Result formatting
//! - [`utils`] - Configuration, tokenizer and progress reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use subdex::engine::Engine;
//! use subdex::index::{Dictionary, IndexConfig};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let dictionary = Dictionary::from_terms(["hell", "worl"]);
//! let engine = Engine::new(dictionary, IndexConfig::default());
//!
//! engine.start_indexing(Path::new("/path/to/tree")).unwrap();
//! engine.wait_for_completion(Duration::from_secs(60));
//!
//! for location in engine.query("hell").results {
//!     println!("{}", location);
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Feeder** - pushes path IDs onto a bounded job queue
//! 2. **Import workers** - read files, cache lines, emit one record per term per file
//! 3. **Index writer** - the only thread that mutates the inverted index
//! 4. **Completion monitor** - counts finished files and flips the run to finished
//!
//! Queries never wait on the pipeline; they read whatever has been applied so far.

pub mod engine;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
#[cfg(all(unix, feature = "daemon"))]
pub mod server;
pub mod utils;

pub use error::{IndexError, Result};
