//! Teardown-safe handle to the live simulation
//!
//! One slot, shared by the UI context, the background loader, the update
//! driver and the event listener. Each caller takes a single snapshot and acts
//! on it; nobody re-reads the slot mid-operation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Shared, lockable simulation instance
pub type SharedSim<S> = Arc<Mutex<S>>;

struct Slot<S> {
    value: Option<SharedSim<S>>,
    /// Set once by `clear`; publish is refused afterwards
    closed: bool,
}

/// Single-slot reference cell with publish/clear semantics
pub struct SessionHandle<S> {
    slot: RwLock<Slot<S>>,
}

impl<S> Default for SessionHandle<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SessionHandle<S> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Slot {
                value: None,
                closed: false,
            }),
        }
    }

    /// Publish a fully constructed instance.
    ///
    /// Returns the shared instance, or `None` if the handle was already
    /// cleared or already holds a value. The instance is dropped in that case.
    pub fn publish(&self, sim: S) -> Option<SharedSim<S>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.closed || slot.value.is_some() {
            return None;
        }
        let shared = Arc::new(Mutex::new(sim));
        slot.value = Some(Arc::clone(&shared));
        Some(shared)
    }

    /// Snapshot of the current value
    pub fn get(&self) -> Option<SharedSim<S>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.value.clone()
    }

    /// Clear the slot for good. Returns the previous value, if any.
    pub fn clear(&self) -> Option<SharedSim<S>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.closed = true;
        slot.value.take()
    }

    /// Run `f` against the live instance, if there is one
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let sim = self.get()?;
        let mut guard = lock_sim(&sim);
        Some(f(&mut guard))
    }
}

/// Lock a shared instance, recovering from a poisoned lock.
///
/// A panic inside the model must not stall every later frame.
pub fn lock_sim<S>(sim: &SharedSim<S>) -> MutexGuard<'_, S> {
    sim.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_publish_then_get() {
        let handle = SessionHandle::new();
        assert!(handle.get().is_none());

        let shared = handle.publish(7u32).unwrap();
        let snapshot = handle.get().unwrap();
        assert!(Arc::ptr_eq(&shared, &snapshot));
        assert_eq!(handle.with(|v| *v), Some(7));
    }

    #[test]
    fn test_second_publish_refused() {
        let handle = SessionHandle::new();
        let first = handle.publish(1u32).unwrap();
        assert!(handle.publish(2u32).is_none());
        assert!(Arc::ptr_eq(&first, &handle.get().unwrap()));
    }

    #[test]
    fn test_cleared_handle_stays_empty() {
        let handle = SessionHandle::new();
        handle.publish(1u32);
        assert!(handle.clear().is_some());
        assert!(handle.publish(2u32).is_none());
        assert!(handle.get().is_none());
        assert_eq!(handle.with(|v| *v), None);
    }

    #[test]
    fn test_clear_before_publish_discards() {
        let handle = SessionHandle::<String>::new();
        assert!(handle.clear().is_none());
        assert!(handle.publish("late".to_string()).is_none());
        assert!(handle.get().is_none());
    }

    #[test]
    fn test_concurrent_publish_and_clear() {
        // Whatever the interleaving, nothing is visible after the clear.
        for _ in 0..50 {
            let handle = Arc::new(SessionHandle::new());
            let publisher = {
                let handle = Arc::clone(&handle);
                thread::spawn(move || handle.publish(vec![0u8; 64]).is_some())
            };
            let clearer = {
                let handle = Arc::clone(&handle);
                thread::spawn(move || {
                    handle.clear();
                })
            };
            let _ = publisher.join();
            let _ = clearer.join();
            assert!(handle.get().is_none());
        }
    }
}
