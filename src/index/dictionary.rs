use crate::error::{IndexError, Result};
use crate::index::types::TermId;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Known terms and their stable IDs
///
/// IDs are 1-based line numbers of the dictionary file. A term listed twice
/// keeps the ID of its last line; blank lines consume an ID but are not terms.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    terms: FxHashMap<Box<str>, TermId>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a line-delimited term file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IndexError::DictionaryUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let dict = Self::from_reader(file).map_err(|source| IndexError::DictionaryUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Dictionary size: {} ({})", dict.len(), path.display());
        Ok(dict)
    }

    /// Parse terms from any reader, one per line
    pub fn from_reader<R: Read>(reader: R) -> std::io::Result<Self> {
        let mut terms = FxHashMap::default();
        let mut line_num: TermId = 0;

        for line in BufReader::new(reader).lines() {
            let line = line?;
            line_num += 1;

            let term = line.strip_suffix('\r').unwrap_or(&line);
            if !term.is_empty() {
                terms.insert(term.into(), line_num);
            }
        }

        Ok(Self { terms })
    }

    /// Build from terms in ID order (first term gets ID 1)
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = FxHashMap::default();
        for (i, term) in terms.into_iter().enumerate() {
            let term = term.as_ref();
            if !term.is_empty() {
                map.insert(term.into(), (i + 1) as TermId);
            }
        }
        Self { terms: map }
    }

    #[inline]
    pub fn get(&self, term: &str) -> Option<TermId> {
        self.terms.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
