use std::path::Path;

use super::env::EnvSource;
use super::file::FileSource;
use super::root::ConfigRoot;
use super::source::{ConfigSource, MemorySource};
use super::ConfigError;

/// Builder for layered configuration.
///
/// Sources are loaded in registration order, with later sources overriding
/// earlier ones key by key. Keys are flat, colon-delimited and
/// case-insensitive (`Database:Host`).
///
/// ## Example
///
/// ```no_run
/// use fabric_config::Config;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     name: String,
///     port: u16,
/// }
///
/// let config: MyConfig = Config::builder()
///     .with_file("config/default.toml", true)
///     .with_file("config/local.toml", false)
///     .build()?
///     .bind()?;
/// # Ok::<(), fabric_config::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Registers an arbitrary source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing contribute nothing.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Loads configuration from environment variables with the given prefix.
    ///
    /// ```no_run
    /// # use fabric_config::Config;
    /// // defaults -> env overrides -> local file overrides env
    /// let root = Config::builder()
    ///     .with_file("config/default.toml", true)
    ///     .with_env("MYAPP", "__")
    ///     .with_file("config/local.toml", false)
    ///     .build()?;
    /// # Ok::<(), fabric_config::ConfigError>(())
    /// ```
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds fixed key/value pairs, typically defaults registered first.
    pub fn with_memory<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.with_source(MemorySource::new(pairs))
    }

    /// Builds a provider for every source and loads them in order.
    ///
    /// The first load error aborts the build and is returned unchanged.
    pub fn build(self) -> Result<ConfigRoot, ConfigError> {
        let providers = self.sources.iter().map(|source| source.build()).collect();
        ConfigRoot::new(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct Server {
        host: String,
        port: u16,
    }

    #[derive(Debug, Deserialize)]
    struct AppConfig {
        name: String,
        server: Server,
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name = \"from-file\"\n[server]\nport = 9000").unwrap();

        let config: AppConfig = Config::builder()
            .with_memory([
                ("name", "default"),
                ("server:host", "localhost"),
                ("server:port", "8080"),
            ])
            .with_file(file.path(), true)
            .build()
            .unwrap()
            .bind()
            .unwrap();

        assert_eq!(config.name, "from-file");
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_required_file_fails_build() {
        let result = Config::builder()
            .with_memory([("name", "x")])
            .with_file("/nonexistent/config.toml", true)
            .build();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_builder() {
        let root = Config::builder().build().unwrap();
        assert!(root.snapshot().is_empty());
    }
}
