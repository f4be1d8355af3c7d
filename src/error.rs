use std::path::PathBuf;

/// Failures surfaced by the indexing core
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File unreadable: {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("An indexing run is already in progress")]
    ConcurrentIndexConflict,

    #[error("Dictionary unavailable: {}: {source}", path.display())]
    DictionaryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Stable name used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            IndexError::DirectoryUnavailable { .. } => "DirectoryUnavailable",
            IndexError::FileUnreadable { .. } => "FileUnreadable",
            IndexError::ConcurrentIndexConflict => "ConcurrentIndexConflict",
            IndexError::DictionaryUnavailable { .. } => "DictionaryUnavailable",
            IndexError::Io(_) => "Io",
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
