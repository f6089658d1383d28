//! Shared extension registry
//!
//! Maps an extension name to its current record. One registry is shared by
//! every instance a facade creates; instances only hold a weak reference.
//! Mutation is insert or replace by name, never partial updates of a record.

use super::ExtensionRecord;
use core::fmt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Internal storage for ExtensionRegistry data
#[derive(Default)]
struct ExtensionRegistryInner {
    records: BTreeMap<String, Arc<ExtensionRecord>>,
}

/// Name to record map shared between editor instances
#[derive(Default)]
pub struct ExtensionRegistry {
    inner: Mutex<ExtensionRegistryInner>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_inner(|inner| {
            f.debug_struct("ExtensionRegistry")
                .field("records", &inner.records.keys().collect::<Vec<_>>())
                .finish()
        })
    }
}

impl ExtensionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ExtensionRegistryInner) -> R,
    {
        let inner = self.inner.lock();
        f(&inner)
    }

    fn with_inner_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ExtensionRegistryInner) -> R,
    {
        let mut inner = self.inner.lock();
        f(&mut inner)
    }

    /// Current record for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ExtensionRecord>> {
        self.with_inner(|inner| inner.records.get(name).cloned())
    }

    /// Whether a record is stored under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.with_inner(|inner| inner.records.contains_key(name))
    }

    /// Store `record` under its name, returning the record it replaced
    pub fn insert(&self, record: Arc<ExtensionRecord>) -> Option<Arc<ExtensionRecord>> {
        let name = record.extension_name().to_string();
        let previous = self.with_inner_mut(|inner| inner.records.insert(name.clone(), record));
        tracing::debug!(
            extension = %name,
            replaced = previous.is_some(),
            "extension stored in registry"
        );
        previous
    }

    /// Drop the record stored under `name`
    pub fn remove(&self, name: &str) -> Option<Arc<ExtensionRecord>> {
        self.with_inner_mut(|inner| inner.records.remove(name))
    }

    /// Registered extension names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.with_inner(|inner| inner.records.keys().cloned().collect())
    }

    /// Number of registered extensions
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_inner(|inner| inner.records.len())
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_inner(|inner| inner.records.is_empty())
    }

    /// Drop every record
    pub fn clear(&self) {
        self.with_inner_mut(|inner| inner.records.clear());
    }
}
