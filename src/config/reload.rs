//! Change notification fired after a provider reloads.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Callback invoked after configuration has been reloaded.
pub type ReloadListener = Arc<dyn Fn() + Send + Sync>;

/// A list of reload listeners.
///
/// Clones share the same listener list, so a clone handed to a host
/// callback notifies everything subscribed through the original.
#[derive(Clone, Default)]
pub struct ReloadNotifier {
    listeners: Arc<Mutex<Vec<ReloadListener>>>,
}

impl ReloadNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: ReloadListener) {
        self.listeners.lock().push(listener);
    }

    /// Invokes every listener in subscription order.
    ///
    /// The list is copied before dispatch so listeners may subscribe
    /// further listeners without deadlocking.
    pub fn notify(&self) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl fmt::Debug for ReloadNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_clones_share_listeners() {
        let notifier = ReloadNotifier::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        notifier.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        notifier.clone().notify();
        notifier.notify();

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_subscribe_during_notify() {
        let notifier = ReloadNotifier::new();
        let inner = notifier.clone();
        notifier.subscribe(Arc::new(move || {
            inner.subscribe(Arc::new(|| {}));
        }));

        notifier.notify();

        assert_eq!(notifier.listener_count(), 2);
    }
}
