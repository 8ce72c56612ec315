//! Shared text buffer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only text buffer that can be shared between consoles.
///
/// Cloning yields another handle to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<String>>);

impl SharedBuffer {
    /// Creates a new empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends text.
    pub fn append(&self, text: &str) {
        self.lock().push_str(text);
    }

    /// Returns a copy of the contents.
    #[must_use]
    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    /// Empties the buffer in place.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been appended since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<&str> for SharedBuffer {
    fn from(initial: &str) -> Self {
        Self(Arc::new(Mutex::new(initial.to_string())))
    }
}
