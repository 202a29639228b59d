use std::fmt;

use parking_lot::RwLock;

use super::data::ConfigData;
use super::reload::ReloadListener;
use super::ConfigError;

/// A registration in the layered configuration pipeline.
///
/// Sources are cheap descriptions; [`build`](Self::build) turns one into the
/// provider that actually holds values.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    fn build(&self) -> Box<dyn ConfigProvider>;
}

/// A loaded layer of flat `a:b:c` keyed values.
pub trait ConfigProvider: Send + Sync + fmt::Debug {
    /// Re-derives all values from the backing store.
    fn load(&self) -> Result<(), ConfigError>;

    fn get(&self, key: &str) -> Option<String>;

    /// Overrides a value in memory until the next load.
    fn set(&self, key: &str, value: &str);

    fn snapshot(&self) -> ConfigData;

    /// Registers a listener fired when the provider reloads on its own.
    ///
    /// Providers without a change channel never fire it.
    fn on_reload(&self, listener: ReloadListener) {
        let _ = listener;
    }
}

/// Lock-guarded mapping backing the static providers.
#[derive(Debug, Default)]
pub(crate) struct DataStore {
    data: RwLock<ConfigData>,
}

impl DataStore {
    pub(crate) fn replace(&self, fresh: ConfigData) {
        *self.data.write() = fresh;
    }

    pub(crate) fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).map(str::to_string)
    }

    pub(crate) fn set(&self, key: &str, value: &str) {
        self.data.write().insert(key, value);
    }

    pub(crate) fn snapshot(&self) -> ConfigData {
        self.data.read().clone()
    }
}

/// A source of fixed in-memory key/value pairs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    initial: ConfigData,
}

impl MemorySource {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            initial: pairs.into_iter().collect(),
        }
    }
}

impl ConfigSource for MemorySource {
    fn build(&self) -> Box<dyn ConfigProvider> {
        Box::new(MemoryProvider {
            initial: self.initial.clone(),
            store: DataStore::default(),
        })
    }
}

#[derive(Debug)]
struct MemoryProvider {
    initial: ConfigData,
    store: DataStore,
}

impl ConfigProvider for MemoryProvider {
    fn load(&self) -> Result<(), ConfigError> {
        self.store.replace(self.initial.clone());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_provider_empty_until_loaded() {
        let provider = MemorySource::new([("App:Name", "demo")]).build();
        assert_eq!(provider.get("App:Name"), None);

        provider.load().unwrap();
        assert_eq!(provider.get("app:name").as_deref(), Some("demo"));
    }

    #[test]
    fn test_set_lasts_until_next_load() {
        let provider = MemorySource::new([("App:Name", "demo")]).build();
        provider.load().unwrap();

        provider.set("App:Name", "override");
        assert_eq!(provider.get("App:Name").as_deref(), Some("override"));

        provider.load().unwrap();
        assert_eq!(provider.get("App:Name").as_deref(), Some("demo"));
    }
}
