//! Application context holding configuration-bound options.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::config::ConfigRoot;
use crate::Error;

/// Central application context holding the layered configuration and the
/// options object bound from it.
///
/// The options are bound once at build time and rebound whenever the
/// configuration reloads. [`options()`](Self::options) hands out the
/// current snapshot; a snapshot never changes once taken.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use fabric_config::{AppContext, Config, MemoryActivationContext};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct MyOptions {
///     my_config_section: MyConfigSection,
/// }
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct MyConfigSection {
///     my_parameter: String,
/// }
///
/// let host = Arc::new(MemoryActivationContext::new());
/// let ctx = AppContext::builder()
///     .with_config(
///         Config::builder()
///             .with_fabric_package(host, "Config")
///             .build()?,
///     )
///     .build::<MyOptions>()?;
///
/// let options = ctx.options();
/// println!("{}", options.my_config_section.my_parameter);
/// # Ok::<(), fabric_config::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext<T> {
    config: Arc<ConfigRoot>,
    options: Arc<RwLock<Arc<T>>>,
}

impl<T> AppContext<T> {
    pub fn config(&self) -> &ConfigRoot {
        &self.config
    }

    /// Returns the options bound from the most recent configuration.
    pub fn options(&self) -> Arc<T> {
        self.options.read().clone()
    }
}

impl AppContext<()> {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder { config: None }
    }
}

/// Builder for constructing an [`AppContext`].
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    config: Option<ConfigRoot>,
}

impl AppContextBuilder {
    /// Attaches the configuration the options are bound from.
    pub fn with_config(self, config: ConfigRoot) -> Self {
        AppContextBuilder {
            config: Some(config),
        }
    }

    /// Binds the options and subscribes to configuration reloads.
    ///
    /// Returns an error if no configuration was provided or the initial bind
    /// fails. A failed rebind after a reload is logged and the previous
    /// options stay in place.
    pub fn build<T>(self) -> Result<AppContext<T>, Error>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let config = Arc::new(self.config.ok_or(Error::MissingConfig)?);
        let options = Arc::new(RwLock::new(Arc::new(config.bind::<T>()?)));

        let weak_config = Arc::downgrade(&config);
        let weak_options = Arc::downgrade(&options);
        config.on_reload(Arc::new(move || {
            let (Some(config), Some(options)) = (weak_config.upgrade(), weak_options.upgrade())
            else {
                return;
            };
            match config.bind::<T>() {
                Ok(fresh) => {
                    *options.write() = Arc::new(fresh);
                    info!("rebound options after configuration reload");
                }
                Err(err) => {
                    error!(error = %err, "failed to rebind options, keeping previous values");
                }
            }
        }));

        Ok(AppContext { config, options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fabric::{ConfigurationPackage, MemoryActivationContext, Parameter, Section};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Limits {
        max_items: u32,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Options {
        limits: Limits,
    }

    fn package(version: &str, max_items: &str) -> ConfigurationPackage {
        ConfigurationPackage::new("Config", version).with_section(
            Section::new("Limits").with_parameter(Parameter::new("MaxItems", max_items)),
        )
    }

    #[test]
    fn test_missing_config() {
        let result = AppContext::builder().build::<Options>();
        assert!(matches!(result, Err(Error::MissingConfig)));
    }

    #[test]
    fn test_options_rebound_on_package_change() {
        let host = Arc::new(MemoryActivationContext::new());
        host.insert_package(package("1.0", "10"));

        let ctx = AppContext::builder()
            .with_config(
                Config::builder()
                    .with_fabric_package(host.clone(), "Config")
                    .build()
                    .unwrap(),
            )
            .build::<Options>()
            .unwrap();

        let before = ctx.options();
        host.replace_package(package("2.0", "25"));

        assert_eq!(before.limits.max_items, 10);
        assert_eq!(ctx.options().limits.max_items, 25);
    }

    #[test]
    fn test_failed_rebind_keeps_previous_options() {
        let host = Arc::new(MemoryActivationContext::new());
        host.insert_package(package("1.0", "10"));

        let ctx = AppContext::builder()
            .with_config(
                Config::builder()
                    .with_fabric_package(host.clone(), "Config")
                    .build()
                    .unwrap(),
            )
            .build::<Options>()
            .unwrap();

        host.replace_package(package("2.0", "lots"));

        assert_eq!(ctx.options().limits.max_items, 10);
        assert_eq!(
            ctx.config().get("Limits:MaxItems").as_deref(),
            Some("lots")
        );
    }
}
