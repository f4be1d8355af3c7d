//! Utility functions shared by the CLI, daemon and indexer.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration file and app data directory (XDG-compliant)
//! - [`progress`] - Progress bars that compile to no-ops without the `progress` feature
//! - [`tokenizer`] - Word splitting and exhaustive substring enumeration
//!
//! ## Key Functions
//!
//! ```no_run
//! use subdex::utils::substrings;
//!
//! let subs: Vec<&str> = substrings("hello", 4).collect();
//! // Returns: ["hell", "ello", "hello"]
//! ```

pub mod app_data;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use tokenizer::*;
