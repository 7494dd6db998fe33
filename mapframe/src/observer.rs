//! Change notification between models and their listeners.
//!
//! An [`Observable`] keeps its listeners in a copy-on-write list: adding or
//! removing a listener swaps in a new list, while notification walks a
//! snapshot loaded without locking. A listener added or removed during a
//! notification therefore only affects later notifications.
//!
//! Listeners run inline, on the thread that mutated the model, in
//! registration order.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use thiserror::Error;

/// Listener of an [`Observable`].
pub trait Observer: Send + Sync {
    /// Called once per mutation batch of the observed model.
    fn on_change(&self);
}

/// Listener registration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ObserverError {
    #[error("Observer is already registered")]
    AlreadyRegistered,

    #[error("Observer is not registered")]
    NotRegistered,
}

type ObserverList = Vec<Arc<dyn Observer>>;

/// Identity of a listener is the address of its allocation.
fn same_observer(a: &Arc<dyn Observer>, b: &Arc<dyn Observer>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Copy-on-write listener list.
pub struct Observable {
    observers: ArcSwap<ObserverList>,
    /// Serializes writers so concurrent adds do not lose each other.
    write_lock: Mutex<()>,
}

impl Observable {
    pub fn new() -> Self {
        Self {
            observers: ArcSwap::new(Arc::new(Vec::new())),
            write_lock: Mutex::new(()),
        }
    }

    /// Registers `observer`.
    ///
    /// # Errors
    ///
    /// [`ObserverError::AlreadyRegistered`] if this exact observer is
    /// already in the list.
    pub fn add_observer(&self, observer: Arc<dyn Observer>) -> Result<(), ObserverError> {
        let _guard = self.write_lock.lock();
        let current = self.observers.load_full();
        if current.iter().any(|o| same_observer(o, &observer)) {
            return Err(ObserverError::AlreadyRegistered);
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(observer);
        self.observers.store(Arc::new(next));
        Ok(())
    }

    /// Unregisters `observer`.
    ///
    /// # Errors
    ///
    /// [`ObserverError::NotRegistered`] if the observer is not in the list.
    pub fn remove_observer(&self, observer: &Arc<dyn Observer>) -> Result<(), ObserverError> {
        let _guard = self.write_lock.lock();
        let current = self.observers.load_full();
        if !current.iter().any(|o| same_observer(o, observer)) {
            return Err(ObserverError::NotRegistered);
        }

        let next: ObserverList = current
            .iter()
            .filter(|o| !same_observer(o, observer))
            .cloned()
            .collect();
        self.observers.store(Arc::new(next));
        Ok(())
    }

    /// Calls every registered listener once.
    ///
    /// Must be called without holding the model's own lock.
    pub fn notify_observers(&self) {
        let snapshot = self.observers.load_full();
        for observer in snapshot.iter() {
            observer.on_change();
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.load().len()
    }
}

impl Default for Observable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observer_count())
            .finish()
    }
}
