use std::sync::Arc;

use super::host::ActivationContext;
use super::provider::FabricConfigProvider;
use crate::config::{Config, ConfigProvider, ConfigSource};

/// Registers a cluster configuration package as a configuration layer.
#[derive(Debug, Clone)]
pub struct FabricConfigSource {
    package_name: String,
    context: Arc<dyn ActivationContext>,
}

impl FabricConfigSource {
    pub fn new(context: Arc<dyn ActivationContext>, package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            context,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }
}

impl ConfigSource for FabricConfigSource {
    fn build(&self) -> Box<dyn ConfigProvider> {
        Box::new(FabricConfigProvider::new(
            self.context.clone(),
            self.package_name.clone(),
        ))
    }
}

impl Config {
    /// Adds the named configuration package from the cluster runtime.
    ///
    /// Parameters appear as `Section:Parameter` keys, and the layer reloads
    /// whenever the runtime reports that the package was modified.
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use fabric_config::{Config, MemoryActivationContext};
    ///
    /// let context = Arc::new(MemoryActivationContext::new());
    /// let root = Config::builder()
    ///     .with_file("config/default.toml", false)
    ///     .with_fabric_package(context, "Config")
    ///     .build()?;
    /// # Ok::<(), fabric_config::ConfigError>(())
    /// ```
    pub fn with_fabric_package(
        self,
        context: Arc<dyn ActivationContext>,
        package_name: impl Into<String>,
    ) -> Self {
        self.with_source(FabricConfigSource::new(context, package_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::fabric::{ConfigurationPackage, MemoryActivationContext, Parameter, Section};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context_with(version: &str, parameter: Parameter) -> Arc<MemoryActivationContext> {
        let context = Arc::new(MemoryActivationContext::new());
        context.insert_package(
            ConfigurationPackage::new("Config", version)
                .with_section(Section::new("MyConfigSection").with_parameter(parameter)),
        );
        context
    }

    #[test]
    fn test_each_build_creates_independent_provider() {
        let context = context_with("1.0", Parameter::new("MyParameter", "a"));
        let source = FabricConfigSource::new(context.clone(), "Config");

        let first = source.build();
        let second = source.build();
        first.load().unwrap();

        assert_eq!(source.package_name(), "Config");
        assert_eq!(first.get("MyConfigSection:MyParameter").as_deref(), Some("a"));
        assert_eq!(second.get("MyConfigSection:MyParameter"), None);
        assert_eq!(context.subscriber_count(), 2);

        drop(second);
        assert_eq!(context.subscriber_count(), 1);
    }

    #[test]
    fn test_fabric_layer_overrides_defaults_and_reloads() {
        let context = context_with("1.0", Parameter::new("MyParameter", "from-package"));
        let root = Config::builder()
            .with_memory([
                ("MyConfigSection:MyParameter", "default"),
                ("MyConfigSection:Other", "kept"),
            ])
            .with_fabric_package(context.clone(), "Config")
            .build()
            .unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        root.on_reload(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(
            root.get("myconfigsection:myparameter").as_deref(),
            Some("from-package")
        );

        context.replace_package(
            ConfigurationPackage::new("Config", "2.0")
                .with_section(Section::new("MyConfigSection")),
        );

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(
            root.get("MyConfigSection:MyParameter").as_deref(),
            Some("default")
        );
        assert_eq!(root.get("MyConfigSection:Other").as_deref(), Some("kept"));
    }

    #[test]
    fn test_numeric_package_value_binds_to_string_field() {
        #[derive(Debug, serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct MyConfigSection {
            my_parameter: String,
        }

        let context = context_with("1.0", Parameter::new("MyParameter", "42"));
        let root = Config::builder()
            .with_fabric_package(context, "Config")
            .build()
            .unwrap();

        let section: MyConfigSection = root.bind_section("MyConfigSection").unwrap();
        assert_eq!(section.my_parameter, "42");
    }

    #[test]
    fn test_missing_package_fails_build() {
        let context = Arc::new(MemoryActivationContext::new());
        let result = Config::builder()
            .with_fabric_package(context, "Missing")
            .build();

        assert!(matches!(result, Err(ConfigError::PackageNotFound(_))));
    }
}
