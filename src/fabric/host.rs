//! The slice of the cluster runtime the provider depends on.
//!
//! A real runtime binding implements [`ActivationContext`]; tests use
//! [`MemoryActivationContext`](super::MemoryActivationContext).

use std::fmt;
use std::sync::Arc;

use super::secure::ProtectedString;
use crate::config::ConfigError;

/// Decrypts the raw value of an encrypted parameter.
///
/// `Ok(None)` means the host produced no protected value at all.
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<Option<ProtectedString>, ConfigError>;
}

impl<F> Decryptor for F
where
    F: Fn(&str) -> Result<Option<ProtectedString>, ConfigError> + Send + Sync,
{
    fn decrypt(&self, ciphertext: &str) -> Result<Option<ProtectedString>, ConfigError> {
        self(ciphertext)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub is_encrypted: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_encrypted: false,
        }
    }

    /// A parameter whose raw value is ciphertext.
    pub fn encrypted(name: impl Into<String>, ciphertext: impl Into<String>) -> Self {
        Self {
            is_encrypted: true,
            ..Self::new(name, ciphertext)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub parameters: Vec<Parameter>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub sections: Vec<Section>,
}

/// A named, versioned bundle of settings sections.
#[derive(Clone)]
pub struct ConfigurationPackage {
    name: String,
    version: String,
    settings: Settings,
    decryptor: Option<Arc<dyn Decryptor>>,
}

impl ConfigurationPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            settings: Settings::default(),
            decryptor: None,
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.settings.sections.push(section);
        self
    }

    pub fn with_decryptor(mut self, decryptor: impl Decryptor + 'static) -> Self {
        self.decryptor = Some(Arc::new(decryptor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decrypts an encrypted parameter into a protected value.
    pub fn decrypt_value(
        &self,
        parameter: &Parameter,
    ) -> Result<Option<ProtectedString>, ConfigError> {
        let decryptor = self.decryptor.as_ref().ok_or_else(|| {
            ConfigError::Decrypt(format!(
                "package '{}' has no decryptor for parameter '{}'",
                self.name, parameter.name
            ))
        })?;
        decryptor.decrypt(&parameter.value)
    }
}

impl fmt::Debug for ConfigurationPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationPackage")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("settings", &self.settings)
            .field("has_decryptor", &self.decryptor.is_some())
            .finish()
    }
}

/// Delivered when the host replaces a configuration package.
#[derive(Debug, Clone)]
pub struct PackageModifiedEvent {
    pub old_package: Option<ConfigurationPackage>,
    pub new_package: ConfigurationPackage,
}

pub type PackageModifiedHandler = Arc<dyn Fn(&PackageModifiedEvent) + Send + Sync>;

/// Keeps a package-modified handler registered; dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes the handler"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wraps the action that removes the handler from the host.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Host activation context: package lookup plus change subscription.
///
/// Implementations must deliver modification events serially.
pub trait ActivationContext: Send + Sync + fmt::Debug {
    fn get_configuration_package(&self, name: &str) -> Result<ConfigurationPackage, ConfigError>;

    /// Registers `handler` until the returned [`Subscription`] is dropped.
    fn subscribe_package_modified(&self, handler: PackageModifiedHandler) -> Subscription;
}
