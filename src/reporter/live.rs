//! Registration of the currently running instance of something.

use std::sync::{Arc, Mutex, PoisonError};

/// Holds at most one shared handle, replaced and cleared under one lock.
///
/// Handles are reference counted, so a caller that got one from `current`
/// can keep using it even if it is cleared concurrently.
#[derive(Debug)]
pub struct LiveInstance<T: ?Sized> {
    current: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized> Default for LiveInstance<T> {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl<T: ?Sized> LiveInstance<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `instance` the current one, returning the one it replaces.
    pub fn register(&self, instance: Arc<T>) -> Option<Arc<T>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(instance)
    }

    pub fn current(&self) -> Option<Arc<T>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Removes the current instance, if any, and returns it.
    pub fn clear(&self) -> Option<Arc<T>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Removes `instance` if it is still the current one. Returns whether it
    /// was removed.
    pub fn clear_if_current(&self, instance: &Arc<T>) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(registered) if Arc::ptr_eq(registered, instance) => {
                *current = None;
                true
            }
            _ => false,
        }
    }
}
