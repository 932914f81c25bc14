//! Cancellable push subscriptions.
//!
//! # Invariants
//! - A listener never runs after its `Subscription` was cancelled or dropped.
//! - Cancellation is idempotent and does not emit a final delivery.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Handle to one live subscription.
///
/// Dropping the handle cancels the subscription.
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, active: Arc<AtomicBool>, detach: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            id,
            active,
            detach: Some(detach),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stops delivery. Later calls are no-ops.
    pub fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Callback plus the liveness flag shared with its `Subscription`.
pub(crate) struct Listener<T> {
    callback: Arc<dyn Fn(T) + Send + Sync>,
    active: Arc<AtomicBool>,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            active: Arc::clone(&self.active),
        }
    }
}

impl<T> Listener<T> {
    pub(crate) fn new(callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    /// Invokes the callback unless the subscription was cancelled meanwhile.
    pub(crate) fn deliver(&self, value: T) {
        if self.active.load(Ordering::SeqCst) {
            (self.callback)(value);
        }
    }
}

/// Id-keyed registry of listener entries shared between a producer and the
/// subscriptions it handed out.
pub(crate) struct ListenerSet<E> {
    next_id: u64,
    entries: BTreeMap<u64, E>,
}

impl<E> Default for ListenerSet<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: BTreeMap::new(),
        }
    }
}

impl<E> ListenerSet<E> {
    pub(crate) fn insert(&mut self, entry: E) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, entry);
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> Option<E> {
        self.entries.remove(&id)
    }

    pub(crate) fn get_mut(&mut self, id: u64) -> Option<&mut E> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u64, &E)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registers `entry` and returns the handle that removes it again.
pub(crate) fn register<E: Send + 'static>(
    set: &Arc<Mutex<ListenerSet<E>>>,
    entry: E,
    active: Arc<AtomicBool>,
) -> Subscription {
    let id = lock(set).insert(entry);
    attach(set, id, active)
}

/// Builds the handle for an entry already inserted under `id`.
///
/// Does not lock `set`, so callers may hold its guard.
pub(crate) fn attach<E: Send + 'static>(
    set: &Arc<Mutex<ListenerSet<E>>>,
    id: u64,
    active: Arc<AtomicBool>,
) -> Subscription {
    let weak: Weak<Mutex<ListenerSet<E>>> = Arc::downgrade(set);
    Subscription::new(
        id,
        active,
        Box::new(move || {
            if let Some(set) = weak.upgrade() {
                // Drop the entry outside the lock; its callback may own
                // resources whose destructors touch this set.
                let removed = lock(&set).remove(id);
                drop(removed);
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::{attach, lock, register, Listener, ListenerSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn cancel_detaches_entry_and_stops_delivery() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let listener = Listener::new(move |_: u8| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let set: Arc<Mutex<ListenerSet<Listener<u8>>>> = Arc::default();

        let mut subscription = register(&set, listener.clone(), listener.active_flag());
        listener.deliver(1);
        assert_eq!(lock(&set).len(), 1);

        subscription.cancel();
        subscription.cancel();
        listener.deliver(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lock(&set).len(), 0);
        assert!(!subscription.is_active());
    }

    #[test]
    fn dropping_handle_cancels() {
        let listener = Listener::new(|_: u8| {});
        let set: Arc<Mutex<ListenerSet<Listener<u8>>>> = Arc::default();
        {
            let _subscription = register(&set, listener.clone(), listener.active_flag());
            assert_eq!(lock(&set).len(), 1);
        }
        assert_eq!(lock(&set).len(), 0);
    }

    #[test]
    fn attach_under_held_guard_builds_working_handle() {
        let listener = Listener::new(|_: u8| {});
        let set: Arc<Mutex<ListenerSet<Listener<u8>>>> = Arc::default();
        let mut subscription = {
            let mut guard = lock(&set);
            let id = guard.insert(listener.clone());
            attach(&set, id, listener.active_flag())
        };
        assert_eq!(lock(&set).len(), 1);

        subscription.cancel();
        assert_eq!(lock(&set).len(), 0);
    }
}
