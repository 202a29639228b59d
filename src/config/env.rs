use super::data::{ConfigData, KEY_DELIMITER};
use super::source::{ConfigProvider, ConfigSource, DataStore};
use super::ConfigError;

/// Environment variables as a configuration source.
///
/// `PREFIX{sep}Section{sep}Key=value` is exposed as `Section:Key`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn collect(&self, vars: impl IntoIterator<Item = (String, String)>) -> ConfigData {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut data = ConfigData::new();

        for (key, value) in vars {
            if let Some(path_str) = key.strip_prefix(&prefix_with_sep) {
                if path_str.is_empty() {
                    continue;
                }

                let path: Vec<&str> = path_str.split(&self.separator).collect();
                data.insert(path.join(KEY_DELIMITER), value);
            }
        }

        data
    }
}

impl ConfigSource for EnvSource {
    fn build(&self) -> Box<dyn ConfigProvider> {
        Box::new(EnvProvider {
            source: self.clone(),
            store: DataStore::default(),
        })
    }
}

#[derive(Debug)]
struct EnvProvider {
    source: EnvSource,
    store: DataStore,
}

impl ConfigProvider for EnvProvider {
    fn load(&self) -> Result<(), ConfigError> {
        self.store.replace(self.source.collect(std::env::vars()));
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
