//! Locations and the lock-free slot that holds a context's current one.

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Keys a location requires before its read or write APIs may be used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMode {
    /// If set, a context's read key must equal this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_key: Option<String>,
    /// If set, a context's write key must equal this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_key: Option<String>,
}

impl LocationMode {
    /// Creates an open mode with no required keys.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Requires a read key.
    #[must_use]
    pub fn with_read_key(mut self, key: impl Into<String>) -> Self {
        self.read_key = Some(key.into());
        self
    }

    /// Requires a write key.
    #[must_use]
    pub fn with_write_key(mut self, key: impl Into<String>) -> Self {
        self.write_key = Some(key.into());
        self
    }

    /// Returns true if `key` satisfies the read requirement.
    #[must_use]
    pub fn allows_read(&self, key: &str) -> bool {
        self.read_key.as_deref().map_or(true, |required| required == key)
    }

    /// Returns true if `key` satisfies the write requirement.
    #[must_use]
    pub fn allows_write(&self, key: &str) -> bool {
        self.write_key.as_deref().map_or(true, |required| required == key)
    }
}

/// Where an operation is targeted.
///
/// The context only stores and retrieves locations; everything else about
/// them belongs to the code that defines them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Location name.
    pub name: String,
    /// Access requirements.
    #[serde(default)]
    pub mode: LocationMode,
}

impl Location {
    /// Creates an open location.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: LocationMode::open(),
        }
    }

    /// Sets the access mode.
    #[must_use]
    pub fn with_mode(mut self, mode: LocationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A lock-free holder for one shared value.
///
/// Stores and loads swap a whole `Arc<T>`, so readers never observe a
/// partially written value and never block writers.
pub struct LocationSlot<T> {
    current: ArcSwapOption<T>,
}

impl<T> LocationSlot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// Creates a slot holding `value`.
    #[must_use]
    pub fn with_value(value: Option<Arc<T>>) -> Self {
        Self {
            current: ArcSwapOption::new(value),
        }
    }

    /// Stores `value`, returning it.
    pub fn store(&self, value: Arc<T>) -> Arc<T> {
        self.current.store(Some(value.clone()));
        value
    }

    /// Loads the current value.
    #[must_use]
    pub fn load(&self) -> Option<Arc<T>> {
        self.current.load_full()
    }

    /// Empties the slot, returning what it held.
    pub fn clear(&self) -> Option<Arc<T>> {
        self.current.swap(None)
    }

    /// Creates an independent slot holding the current value.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self::with_value(self.load())
    }
}

impl<T> Default for LocationSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LocationSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LocationSlot").field(&self.load()).finish()
    }
}
