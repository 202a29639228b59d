//! Cluster runtime configuration packages as a configuration layer.
//!
//! A package holds named sections of parameters. [`FabricConfigProvider`]
//! flattens them into `Section:Parameter` keys, decrypting encrypted
//! parameters through [`to_unsecure_string`], and rebuilds its values when
//! the [`ActivationContext`] reports that the package was modified.

mod host;
mod memory;
mod provider;
mod secure;
mod source;

pub use host::{
    ActivationContext, ConfigurationPackage, Decryptor, PackageModifiedEvent,
    PackageModifiedHandler, Parameter, Section, Settings, Subscription,
};
pub use memory::MemoryActivationContext;
pub use provider::{flatten_package, FabricConfigProvider};
pub use secure::{to_unsecure_string, ProtectedString};
pub use source::FabricConfigSource;
