use crate::error::{IndexError, Result};
use crate::index::types::PathId;
use ignore::WalkBuilder;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// One enumerated entry: the on-disk relative path and its `/`-joined display form
#[derive(Debug, Clone)]
struct PathEntry {
    rel: PathBuf,
    display: String,
}

/// Ordered list of enumerated paths; a path's position is its ID
#[derive(Debug, Clone, Default)]
pub struct PathList {
    root: PathBuf,
    paths: Vec<PathEntry>,
    /// Display path -> ID, built on first reverse lookup
    by_display: OnceLock<FxHashMap<String, PathId>>,
}

impl PathList {
    /// Walk `root` recursively and list every entry below it
    ///
    /// The walk is sorted by file name so path IDs are reproducible across
    /// runs over an unchanged tree. Nothing is returned if the root itself
    /// cannot be read.
    pub fn enumerate(root: &Path, skip_hidden: bool) -> Result<Self> {
        let unavailable = |source| IndexError::DirectoryUnavailable {
            path: root.to_path_buf(),
            source,
        };

        let root = root.canonicalize().map_err(unavailable)?;
        fs::read_dir(&root).map_err(unavailable)?;

        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .hidden(skip_hidden)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Skipping entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            match entry.path().strip_prefix(&root) {
                Ok(rel) => paths.push(PathEntry {
                    display: display_path(rel),
                    rel: rel.to_path_buf(),
                }),
                Err(_) => log::debug!("Entry outside root: {}", entry.path().display()),
            }
        }

        log::info!("Found {} items in path list", paths.len());

        Ok(Self {
            root,
            paths,
            by_display: OnceLock::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Root-relative display form of a path (lossy for non-UTF-8 names)
    pub fn get(&self, id: PathId) -> Option<&str> {
        self.paths.get(id as usize).map(|p| p.display.as_str())
    }

    /// Absolute path on disk, built from the original name bytes
    pub fn full_path(&self, id: PathId) -> Option<PathBuf> {
        self.paths
            .get(id as usize)
            .map(|p| self.root.join(&p.rel))
    }

    /// Reverse lookup of a display path; the first ID wins if two names render alike
    pub fn id_of(&self, path: &str) -> Option<PathId> {
        self.by_display
            .get_or_init(|| {
                let mut map = FxHashMap::default();
                for (id, display) in self.iter() {
                    map.entry(display.to_string()).or_insert(id);
                }
                map
            })
            .get(path)
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PathId, &str)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, p)| (i as PathId, p.display.as_str()))
    }
}

/// Join components with `/` regardless of platform
fn display_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
