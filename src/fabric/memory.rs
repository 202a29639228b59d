use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::host::{
    ActivationContext, ConfigurationPackage, PackageModifiedEvent, PackageModifiedHandler,
    Subscription,
};
use crate::config::ConfigError;

type Handlers = Arc<Mutex<Vec<(u64, PackageModifiedHandler)>>>;

#[derive(Default)]
struct Dispatch {
    queue: VecDeque<PackageModifiedEvent>,
    running: bool,
}

/// An in-process activation context holding packages in memory.
///
/// [`replace_package`](Self::replace_package) plays the role of a cluster
/// upgrade: it swaps the package and delivers a modification event to every
/// subscriber. Events are delivered one at a time, in replacement order.
#[derive(Default)]
pub struct MemoryActivationContext {
    packages: RwLock<HashMap<String, ConfigurationPackage>>,
    handlers: Handlers,
    next_id: Mutex<u64>,
    dispatch: Mutex<Dispatch>,
    unavailable: Option<String>,
}

impl MemoryActivationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose every lookup fails, as when the process was not
    /// started by the cluster runtime.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Adds or overwrites a package without notifying subscribers.
    pub fn insert_package(&self, package: ConfigurationPackage) {
        self.packages
            .write()
            .insert(package.name().to_string(), package);
    }

    /// Replaces a package and notifies subscribers in subscription order.
    ///
    /// No lock is held while handlers run. A replacement made while another
    /// event is being delivered, from a handler or another thread, is queued
    /// and delivered by the thread already dispatching once the current event
    /// has reached every subscriber.
    pub fn replace_package(&self, package: ConfigurationPackage) {
        {
            let mut dispatch = self.dispatch.lock();
            let old_package = self
                .packages
                .write()
                .insert(package.name().to_string(), package.clone());
            dispatch.queue.push_back(PackageModifiedEvent {
                old_package,
                new_package: package,
            });
            if dispatch.running {
                return;
            }
            dispatch.running = true;
        }

        loop {
            let event = {
                let mut dispatch = self.dispatch.lock();
                match dispatch.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        dispatch.running = false;
                        return;
                    }
                }
            };
            self.deliver(&event);
        }
    }

    fn deliver(&self, event: &PackageModifiedEvent) {
        let handlers: Vec<PackageModifiedHandler> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        debug!(
            package = event.new_package.name(),
            version = event.new_package.version(),
            subscribers = handlers.len(),
            "configuration package modified"
        );
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl ActivationContext for MemoryActivationContext {
    fn get_configuration_package(&self, name: &str) -> Result<ConfigurationPackage, ConfigError> {
        if let Some(reason) = &self.unavailable {
            return Err(ConfigError::ActivationContextUnavailable(reason.clone()));
        }
        self.packages
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::PackageNotFound(name.to_string()))
    }

    fn subscribe_package_modified(&self, handler: PackageModifiedHandler) -> Subscription {
        let id = {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            *next_id
        };
        self.handlers.lock().push((id, handler));

        let handlers = Arc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.lock().retain(|(registered, _)| *registered != id);
            }
        })
    }
}

impl fmt::Debug for MemoryActivationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.packages.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("MemoryActivationContext")
            .field("packages", &names)
            .field("subscribers", &self.subscriber_count())
            .field("unavailable", &self.unavailable)
            .finish()
    }
}
