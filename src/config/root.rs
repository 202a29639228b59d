//! The merged view over every loaded provider.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::{Table, Value};

use super::bind::ValueDeserializer;
use super::data::ConfigData;
use super::reload::{ReloadListener, ReloadNotifier};
use super::source::ConfigProvider;
use super::tree::{section, to_table};
use super::ConfigError;

/// Layered configuration produced by [`Config::build`](super::Config::build).
///
/// Lookups consult providers from the last registered to the first, so a
/// later layer shadows an earlier one key by key.
pub struct ConfigRoot {
    providers: Vec<Box<dyn ConfigProvider>>,
    notifier: ReloadNotifier,
}

impl ConfigRoot {
    pub(crate) fn new(providers: Vec<Box<dyn ConfigProvider>>) -> Result<Self, ConfigError> {
        let notifier = ReloadNotifier::new();
        for provider in &providers {
            provider.load()?;
            let forward = notifier.clone();
            provider.on_reload(Arc::new(move || forward.notify()));
        }
        Ok(Self {
            providers,
            notifier,
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.providers.iter().rev().find_map(|p| p.get(key))
    }

    /// Sets the value in every provider, so it survives any shadowing.
    pub fn set(&self, key: &str, value: &str) {
        for provider in &self.providers {
            provider.set(key, value);
        }
    }

    /// Merges every provider into one mapping, later layers winning.
    pub fn snapshot(&self) -> ConfigData {
        let mut merged = ConfigData::new();
        for provider in &self.providers {
            merged.merge(&provider.snapshot());
        }
        merged
    }

    /// Reloads every provider in order, then notifies reload listeners.
    pub fn reload(&self) -> Result<(), ConfigError> {
        for provider in &self.providers {
            provider.load()?;
        }
        self.notifier.notify();
        Ok(())
    }

    /// Registers a listener fired after any provider reloads.
    pub fn on_reload(&self, listener: ReloadListener) {
        self.notifier.subscribe(listener);
    }

    /// Deserializes the whole configuration into `T`.
    ///
    /// Each call binds a fresh snapshot, so values reflect the latest reload.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        deserialize(to_table(&self.snapshot()))
    }

    /// Deserializes the section at a colon-delimited path into `T`.
    ///
    /// A missing section binds as an empty table.
    pub fn bind_section<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        let table = to_table(&self.snapshot());
        let sub = section(&table, path).cloned().unwrap_or_default();
        deserialize(sub)
    }
}

fn deserialize<T: DeserializeOwned>(table: Table) -> Result<T, ConfigError> {
    let value = Value::Table(table);
    <T as Deserialize>::deserialize(ValueDeserializer::new(&value))
        .map_err(ConfigError::DeserializeError)
}

impl fmt::Debug for ConfigRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRoot")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
