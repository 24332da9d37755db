//! Observer registry keyed by subscription handle.
//!
//! Observers are notified in registration order. A panicking observer is
//! caught and reported; the remaining observers still run.

use crate::core::emotion::EmotionSnapshot;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Callback invoked with every emitted snapshot.
pub type Observer = Arc<dyn Fn(&EmotionSnapshot) + Send + Sync>;

/// Identifier of one registration. Ids are never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Registered observers, ordered by registration.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: AtomicU64,
    observers: Mutex<BTreeMap<SubscriptionId, Observer>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, observer);
        id
    }

    /// Remove one observer. Returns `false` if it was already gone.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every observer in registration order. Returns the number that panicked.
    pub fn notify(&self, snapshot: &EmotionSnapshot) -> usize {
        // Call outside the lock so observers may subscribe or unsubscribe
        let observers: Vec<(SubscriptionId, Observer)> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, observer)| (*id, observer.clone()))
            .collect();

        let mut failures = 0;
        for (id, observer) in observers {
            if call_isolated(&observer, snapshot).is_err() {
                tracing::warn!("Observer {:?} panicked while handling {}", id, snapshot.emotion);
                failures += 1;
            }
        }
        failures
    }
}

/// Run an observer, converting a panic into an error.
pub(crate) fn call_isolated(observer: &Observer, snapshot: &EmotionSnapshot) -> Result<(), String> {
    panic::catch_unwind(AssertUnwindSafe(|| observer(snapshot))).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::debug!("Observer panic: {}", message);
        message
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Capability to deregister one observer.
///
/// Dropping the handle keeps the observer registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<ObserverRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: &Arc<ObserverRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the observer. Idempotent; returns `true` only on the call that removed it.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::emotion::Emotion;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Observer {
        let log = log.clone();
        Arc::new(move |_| log.lock().unwrap().push(name))
    }

    #[test]
    fn test_notifies_in_registration_order() {
        let registry = ObserverRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(recorder(&log, "first"));
        registry.register(recorder(&log, "second"));
        registry.register(recorder(&log, "third"));

        registry.notify(&EmotionSnapshot::new(Emotion::Bored, 0.6));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let registry = ObserverRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(recorder(&log, "before"));
        registry.register(Arc::new(|_| panic!("observer failure")));
        registry.register(recorder(&log, "after"));

        let failures = registry.notify(&EmotionSnapshot::new(Emotion::Happy, 0.65));
        assert_eq!(failures, 1);
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one_and_is_idempotent() {
        let registry = Arc::new(ObserverRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        // The same callback registered twice is two subscriptions
        let shared = recorder(&log, "shared");
        let a = Subscription::new(registry.register(shared.clone()), &registry);
        let _b = Subscription::new(registry.register(shared), &registry);

        assert!(a.unsubscribe());
        assert!(!a.unsubscribe());
        assert_eq!(registry.len(), 1);

        registry.notify(&EmotionSnapshot::new(Emotion::Curious, 0.7));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = Arc::new(ObserverRegistry::new());
        let sub = Subscription::new(registry.register(Arc::new(|_| {})), &registry);
        drop(registry);
        assert!(!sub.unsubscribe());
    }
}
