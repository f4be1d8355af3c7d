//! Indexing: enumeration, import, the single index writer, and completion tracking

pub mod dictionary;
pub mod import;
pub mod inverted;
pub mod line_cache;
pub mod monitor;
pub mod paths;
pub mod run;
pub mod types;
pub mod writer;

pub use dictionary::Dictionary;
pub use inverted::InvertedIndex;
pub use line_cache::LineCache;
pub use paths::PathList;
pub use run::IndexRun;
pub use types::*;
pub use writer::IndexWriter;
