//! File-based configuration source.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::data::ConfigData;
use super::source::{ConfigProvider, ConfigSource, DataStore};
use super::tree::flatten_table;
use super::ConfigError;

/// A configuration source that loads from a TOML file.
///
/// Nested tables become colon-delimited keys, so `[server] host = "x"`
/// is exposed as `server:host`. Files can be marked as required or optional.
/// Required files that don't exist cause an error; optional files that don't
/// exist contribute no values.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, loading fails if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }
}

impl ConfigSource for FileSource {
    fn build(&self) -> Box<dyn ConfigProvider> {
        Box::new(FileProvider {
            source: self.clone(),
            store: DataStore::default(),
        })
    }
}

#[derive(Debug)]
struct FileProvider {
    source: FileSource,
    store: DataStore,
}

impl ConfigProvider for FileProvider {
    fn load(&self) -> Result<(), ConfigError> {
        let data = match load_config_file(&self.source.path, self.source.required)? {
            Some(table) => flatten_table(&table),
            None => {
                warn!(path = %self.source.path.display(), "optional config file not found");
                ConfigData::new()
            }
        };
        debug!(path = %self.source.path.display(), keys = data.len(), "loaded config file");
        self.store.replace(data);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.store.set(key, value);
    }

    fn snapshot(&self) -> ConfigData {
        self.store.snapshot()
    }
}

/// Loads and parses a TOML config file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_config_file(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
