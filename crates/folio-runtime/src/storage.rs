#![forbid(unsafe_code)]

//! Local key-value persistence for cached counts.
//!
//! The browser's local storage may be missing (private browsing), full
//! (quota) or throw on access. Every call therefore returns a `Result`, and
//! [`CountCache`] turns any failure into a cache miss or a skipped write.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Store unavailable | Private mode, storage disabled | Cache miss |
//! | Write rejected | Quota exceeded | Write skipped |
//! | Unparseable entry | Tampered or foreign value | Cache miss |

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use folio_core::counter_key::CounterKey;
use tracing::trace;

/// Errors from a key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The store cannot be reached at all.
    Unavailable(String),
    /// The store refused the write for lack of space.
    QuotaExceeded,
    /// The platform rejected the access (security policy, sandbox).
    Denied(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
            Self::QuotaExceeded => write!(f, "storage quota exceeded"),
            Self::Denied(msg) => write!(f, "storage access denied: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Synchronous, string-keyed, string-valued store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-process store for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<K: Into<String>, V: Into<String>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            entries: RefCell::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Parse a cached count: a non-negative integer, surrounding whitespace allowed.
#[must_use]
pub fn parse_cached_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<u64>().ok()
}

/// Fault-tolerant view of a store, keyed by [`CounterKey`].
#[derive(Clone)]
pub struct CountCache {
    store: Rc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CountCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountCache").finish_non_exhaustive()
    }
}

impl CountCache {
    #[must_use]
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cached count for `key`; any failure reads as a miss.
    #[must_use]
    pub fn read(&self, key: &CounterKey) -> Option<u64> {
        match self.store.get(&key.cache_key()) {
            Ok(Some(raw)) => {
                let parsed = parse_cached_count(&raw);
                if parsed.is_none() {
                    trace!(target: "folio.cache", %key, raw = %raw, "ignoring unparseable cache entry");
                }
                parsed
            }
            Ok(None) => None,
            Err(err) => {
                trace!(target: "folio.cache", %key, error = %err, "cache read failed");
                None
            }
        }
    }

    /// Overwrite the cached count; failures are swallowed.
    pub fn write(&self, key: &CounterKey, count: u64) {
        if let Err(err) = self.store.set(&key.cache_key(), &count.to_string()) {
            trace!(target: "folio.cache", %key, error = %err, "cache write skipped");
        }
    }
}
