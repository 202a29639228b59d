//! Configuration provider backed by a cluster configuration package.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, info};

use super::host::{ActivationContext, ConfigurationPackage, PackageModifiedEvent, Subscription};
use super::secure::to_unsecure_string;
use crate::config::{
    combine_key, ConfigData, ConfigError, ConfigProvider, ReloadListener, ReloadNotifier,
};

/// Exposes the sections of one configuration package as `Section:Parameter`
/// keys.
///
/// Encrypted parameters are decrypted at load time and stored as plaintext.
/// Every load replaces the whole mapping, so parameters removed from the
/// package disappear. When the host reports that the package was modified,
/// the provider rebuilds its mapping from the new snapshot and fires its
/// reload listeners. Dropping the provider unsubscribes it from the host.
#[derive(Debug)]
pub struct FabricConfigProvider {
    package_name: String,
    context: Arc<dyn ActivationContext>,
    data: Arc<RwLock<ConfigData>>,
    notifier: ReloadNotifier,
    _subscription: Subscription,
}

impl FabricConfigProvider {
    /// Creates the provider and subscribes to modifications of `package_name`.
    ///
    /// No values are present until [`load`](ConfigProvider::load) is called.
    pub fn new(context: Arc<dyn ActivationContext>, package_name: impl Into<String>) -> Self {
        let package_name = package_name.into();
        let data = Arc::new(RwLock::new(ConfigData::new()));
        let notifier = ReloadNotifier::new();

        let watched = package_name.clone();
        let weak_data = Arc::downgrade(&data);
        let on_change = notifier.clone();
        let subscription =
            context.subscribe_package_modified(Arc::new(move |event: &PackageModifiedEvent| {
                apply_modified(&watched, &weak_data, &on_change, event);
            }));

        Self {
            package_name,
            context,
            data,
            notifier,
            _subscription: subscription,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }
}

impl ConfigProvider for FabricConfigProvider {
    fn load(&self) -> Result<(), ConfigError> {
        let package = self
            .context
            .get_configuration_package(&self.package_name)?;
        let fresh = flatten_package(&package)?;
        debug!(
            package = %self.package_name,
            version = package.version(),
            keys = fresh.len(),
            "loaded configuration package"
        );
        *self.data.write() = fresh;
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) {
        self.data.write().insert(key, value);
    }

    fn snapshot(&self) -> ConfigData {
        self.data.read().clone()
    }

    fn on_reload(&self, listener: ReloadListener) {
        self.notifier.subscribe(listener);
    }
}

fn apply_modified(
    package_name: &str,
    data: &Weak<RwLock<ConfigData>>,
    notifier: &ReloadNotifier,
    event: &PackageModifiedEvent,
) {
    if event.new_package.name() != package_name {
        return;
    }
    // Provider already dropped.
    let Some(data) = data.upgrade() else {
        return;
    };

    match flatten_package(&event.new_package) {
        Ok(fresh) => {
            let keys = fresh.len();
            *data.write() = fresh;
            info!(
                package = package_name,
                version = event.new_package.version(),
                keys,
                "reloaded configuration package"
            );
            notifier.notify();
        }
        Err(err) => {
            error!(
                package = package_name,
                version = event.new_package.version(),
                error = %err,
                "failed to reload configuration package, keeping previous values"
            );
        }
    }
}

/// Flattens every section and parameter into `Section:Parameter` keys,
/// decrypting encrypted parameters. Later duplicates overwrite earlier ones.
pub fn flatten_package(package: &ConfigurationPackage) -> Result<ConfigData, ConfigError> {
    let mut data = ConfigData::new();
    for section in &package.settings().sections {
        for parameter in &section.parameters {
            let value = if parameter.is_encrypted {
                let protected = package.decrypt_value(parameter)?;
                to_unsecure_string(protected.as_ref())?
            } else {
                parameter.value.clone()
            };
            data.insert(combine_key(&section.name, &parameter.name), value);
        }
    }
    Ok(data)
}
