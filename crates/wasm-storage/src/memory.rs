//! In-memory key-value store for native builds and tests

use crate::KeyValueStore;
use sr2map_shared::StorageError;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Map-backed store with an optional byte quota.
///
/// The quota counts key and value bytes across all entries, like the
/// browser's per-origin limit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes currently used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let current = self
                .entries
                .borrow()
                .get(key)
                .map(|v| key.len() + v.len())
                .unwrap_or(0);
            let projected = self.used_bytes() - current + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set_item("user_pins", "[]").unwrap();

        assert_eq!(store.get_item("user_pins").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.keys().unwrap(), vec!["user_pins".to_string()]);

        store.remove_item("user_pins").unwrap();
        assert!(store.get_item("user_pins").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let store = MemoryStore::with_quota(20);
        store.set_item("k", "0123456789").unwrap();

        let err = store.set_item("other", "0123456789").unwrap_err();
        assert_eq!(
            err,
            StorageError::QuotaExceeded {
                key: "other".to_string()
            }
        );
        assert!(store.get_item("other").unwrap().is_none());

        // Replacing an existing value only counts the difference
        store.set_item("k", "012345678901234").unwrap();
        assert_eq!(store.used_bytes(), 16);
    }
}
