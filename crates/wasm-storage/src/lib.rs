//! Persisted key-value storage for user datasets
//!
//! [`KeyValueStore`] abstracts the raw string store (browser `localStorage`
//! or an in-memory map), and [`PersistedStore`] layers typed JSON reads and
//! writes on top of it. Reads never fail: missing or corrupt entries come
//! back as the dataset's empty value.

pub mod memory;
pub mod simple;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sr2map_shared::{Dataset, FoundKey, PinRecord, PlotPlan, StorageError, PINS_KEY, PLOTS_KEY};
use std::rc::Rc;

pub use memory::MemoryStore;
pub use simple::SimpleStorage;

/// Raw string key-value storage
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Typed JSON access to the user datasets.
///
/// Cloning is cheap and every clone sees the same backing store.
#[derive(Clone)]
pub struct PersistedStore {
    backend: Rc<dyn KeyValueStore>,
}

impl PersistedStore {
    pub fn new(backend: Rc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by a fresh in-memory map
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStore::new()))
    }

    /// Store backed by the browser's `localStorage`
    pub fn local_storage() -> Self {
        Self::new(Rc::new(SimpleStorage::local()))
    }

    /// Read the raw JSON under `key`, falling back to `empty`
    pub fn read_value(&self, key: &str, empty: Value) -> Value {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return empty,
            Err(e) => {
                log::warn!("Failed to read {key}: {e}");
                return empty;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Corrupt JSON under {key}, using empty value: {e}");
                empty
            }
        }
    }

    /// Read and deserialize `key`, falling back to `T::default()`
    pub fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                log::warn!("Failed to read {key}: {e}");
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Unexpected data under {key}, using empty value: {e}");
            T::default()
        })
    }

    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        log::debug!("Writing {} bytes to {key}", json.len());
        self.backend.set_item(key, &json)
    }

    pub fn write_value(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.write(key, value)
    }

    /// Raw string under `key`, used to compare entries byte for byte
    pub fn raw(&self, key: &str) -> Option<String> {
        self.backend.get_item(key).ok().flatten()
    }

    pub fn read_plots(&self) -> Vec<PlotPlan> {
        self.read(PLOTS_KEY)
    }

    pub fn read_pins(&self) -> Vec<PinRecord> {
        self.read(PINS_KEY)
    }

    pub fn read_found_key(&self, key: FoundKey) -> Vec<Value> {
        self.read(key.storage_key())
    }

    /// Found object with all seven keys, each read verbatim
    pub fn read_found_value(&self) -> Value {
        let mut out = Map::new();
        for key in FoundKey::ALL {
            out.insert(
                key.storage_key().to_string(),
                self.read_value(key.storage_key(), Value::Array(Vec::new())),
            );
        }
        Value::Object(out)
    }

    /// Verbatim payload of a dataset as it would appear in an export
    pub fn read_dataset_value(&self, dataset: Dataset) -> Value {
        match dataset {
            Dataset::Plots => self.read_value(PLOTS_KEY, Value::Array(Vec::new())),
            Dataset::Pins => self.read_value(PINS_KEY, Value::Array(Vec::new())),
            Dataset::Found => self.read_found_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_keys_read_as_empty() {
        let store = PersistedStore::in_memory();

        assert!(store.read_plots().is_empty());
        assert!(store.read_pins().is_empty());
        assert_eq!(store.read_dataset_value(Dataset::Pins), json!([]));

        let found = store.read_dataset_value(Dataset::Found);
        let found = found.as_object().unwrap();
        assert_eq!(found.len(), 7);
        assert!(found.values().all(|v| v == &json!([])));
    }

    #[test]
    fn test_corrupt_entry_reads_as_empty() {
        let backend = Rc::new(MemoryStore::new());
        backend.set_item(PINS_KEY, "[{broken").unwrap();
        backend.set_item(PLOTS_KEY, r#"{"not": "an array"}"#).unwrap();
        let store = PersistedStore::new(backend);

        assert!(store.read_pins().is_empty());
        assert!(store.read_plots().is_empty());
        assert_eq!(store.read_value(PINS_KEY, json!([])), json!([]));
    }

    #[test]
    fn test_write_then_read_typed() {
        let store = PersistedStore::in_memory();
        let plots = vec![PlotPlan::new("conservatory", vec![json!({"plot": 1})])];
        store.write(PLOTS_KEY, &plots).unwrap();

        assert_eq!(store.read_plots(), plots);
        assert_eq!(
            store.raw(PLOTS_KEY).unwrap(),
            r#"[{"site":"conservatory","plotPlans":[{"plot":1}]}]"#
        );
    }

    #[test]
    fn test_read_value_keeps_numbers_verbatim() {
        let store = PersistedStore::in_memory();
        let pins = json!([{"icon": "a", "pos": {"x": 1, "y": 2}, "dimension": "sr2"}]);
        store.write_value(PINS_KEY, &pins).unwrap();

        assert_eq!(store.read_dataset_value(Dataset::Pins), pins);
    }
}
