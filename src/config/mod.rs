//! Layered configuration loading and management.

mod bind;
mod builder;
mod data;
mod env;
mod error;
mod file;
mod reload;
mod root;
mod source;
mod tree;

pub use builder::Config;
pub use data::{combine_key, ConfigData, KEY_DELIMITER};
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use reload::{ReloadListener, ReloadNotifier};
pub use root::ConfigRoot;
pub use source::{ConfigProvider, ConfigSource, MemorySource};
