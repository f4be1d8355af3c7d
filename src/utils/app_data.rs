use crate::index::types::IndexConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "subdex";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shortest substring that is indexed; shorter queries use a linear scan
    #[serde(default = "default_min_substr_len")]
    pub min_substr_len: usize,

    /// Number of import workers. 0 means one per CPU core
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Records buffered between workers and the index writer
    #[serde(default = "default_ingest_queue_capacity")]
    pub ingest_queue_capacity: usize,

    /// Path IDs buffered between the feeder and the workers
    #[serde(default = "default_job_queue_capacity")]
    pub job_queue_capacity: usize,

    /// Line-delimited term file; relative paths resolve against the working directory
    #[serde(default = "default_dictionary_path")]
    pub dictionary_path: PathBuf,

    /// Skip dot-files while enumerating
    #[serde(default)]
    pub skip_hidden: bool,

    /// Cached query results per finished run (daemon only)
    #[serde(default = "default_query_cache_size")]
    pub query_cache_size: usize,
}

fn default_min_substr_len() -> usize {
    4
}

fn default_workers() -> usize {
    20
}

fn default_ingest_queue_capacity() -> usize {
    4096
}

fn default_job_queue_capacity() -> usize {
    1024
}

fn default_dictionary_path() -> PathBuf {
    PathBuf::from("dictionary.txt")
}

fn default_query_cache_size() -> usize {
    128
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_substr_len: default_min_substr_len(),
            workers: default_workers(),
            ingest_queue_capacity: default_ingest_queue_capacity(),
            job_queue_capacity: default_job_queue_capacity(),
            dictionary_path: default_dictionary_path(),
            skip_hidden: false,
            query_cache_size: default_query_cache_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit file, or return default if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the effective worker count (resolves 0 to CPU count)
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus()
        } else {
            self.workers
        }
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            min_substr_len: self.min_substr_len,
            workers: self.effective_workers(),
            ingest_queue_capacity: self.ingest_queue_capacity,
            job_queue_capacity: self.job_queue_capacity,
            skip_hidden: self.skip_hidden,
        }
        .normalized()
    }
}

/// Get the number of CPUs available
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.min_substr_len, 4);
        assert_eq!(config.workers, 20);
        assert_eq!(config.dictionary_path, PathBuf::from("dictionary.txt"));
        assert!(!config.skip_hidden);
    }

    #[test]
    fn test_effective_workers() {
        let mut config = AppConfig::default();
        assert_eq!(config.effective_workers(), 20);

        // 0 should resolve to CPU count
        config.workers = 0;
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn test_index_config_clamps() {
        let config = AppConfig {
            min_substr_len: 0,
            ingest_queue_capacity: 0,
            ..AppConfig::default()
        };
        let index_config = config.index_config();
        assert_eq!(index_config.min_substr_len, 1);
        assert_eq!(index_config.ingest_queue_capacity, 1);
        assert_eq!(index_config.workers, 20);
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"workers": 1, "dictionary_path": "/usr/share/dict/words"}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.workers, 1);
        assert_eq!(config.dictionary_path, PathBuf::from("/usr/share/dict/words"));
        assert_eq!(config.min_substr_len, 4); // default
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
