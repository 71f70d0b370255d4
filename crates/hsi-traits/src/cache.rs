//! Read-through cache capability for fetched market data.
//!
//! The pipeline only talks to this trait, so it can run against an in-memory
//! store in tests and a file-backed store in production.

use crate::{DatedTable, Result};
use std::collections::HashMap;

/// Key/value store for dated tables.
///
/// # Example
///
/// ```
/// use hsi_traits::{DatedTable, MemoryCache, PriceCache};
///
/// let mut cache = MemoryCache::default();
/// assert!(!cache.has("prices"));
/// cache.put("prices", &DatedTable::new(vec![], vec![]).unwrap()).unwrap();
/// assert!(cache.has("prices"));
/// ```
pub trait PriceCache {
    /// Whether an entry exists for `key`.
    fn has(&self, key: &str) -> bool;

    /// Reads the entry for `key`; `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<DatedTable>>;

    /// Stores `table` under `key`, replacing any previous entry.
    fn put(&mut self, key: &str, table: &DatedTable) -> Result<()>;
}

/// In-process cache backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: HashMap<String, DatedTable>,
}

impl MemoryCache {
    /// Creates a cache pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, table: DatedTable) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), table);
        Self { entries }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PriceCache for MemoryCache {
    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Result<Option<DatedTable>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, table: &DatedTable) -> Result<()> {
        self.entries.insert(key.to_string(), table.clone());
        Ok(())
    }
}
