pub mod config;
pub mod context;
mod error;
pub mod fabric;

pub use config::{Config, ConfigError, ConfigRoot};
pub use context::AppContext;
pub use error::Error;
pub use fabric::{FabricConfigProvider, FabricConfigSource, MemoryActivationContext};
