use crate::KeyValueStore;
use sr2map_shared::StorageError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Simple browser storage using only LocalStorage and SessionStorage
pub struct SimpleStorage {
    use_session: bool,
}

impl SimpleStorage {
    /// Create storage using LocalStorage
    pub fn local() -> Self {
        Self { use_session: false }
    }

    /// Create storage using SessionStorage
    pub fn session() -> Self {
        Self { use_session: true }
    }

    /// Clear all storage
    pub fn clear(&self) -> Result<(), StorageError> {
        let storage = self.get_storage()?;
        storage.clear().map_err(|e| unavailable(&e))
    }

    fn get_storage(&self) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable {
            message: "No window object".to_string(),
        })?;

        let storage = if self.use_session {
            window.session_storage()
        } else {
            window.local_storage()
        };

        let name = if self.use_session {
            "SessionStorage"
        } else {
            "LocalStorage"
        };

        storage
            .map_err(|_| StorageError::Unavailable {
                message: format!("{name} not available"),
            })?
            .ok_or_else(|| StorageError::Unavailable {
                message: format!("{name} not supported"),
            })
    }
}

impl KeyValueStore for SimpleStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = self.get_storage()?;
        storage.get_item(key).map_err(|e| unavailable(&e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.get_storage()?;
        storage
            .set_item(key, value)
            .map_err(|e| write_error(key, &e))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let storage = self.get_storage()?;
        storage.remove_item(key).map_err(|e| write_error(key, &e))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let storage = self.get_storage()?;
        let mut keys = Vec::new();

        for i in 0..storage.length().map_err(|e| unavailable(&e))? {
            if let Some(key) = storage.key(i).map_err(|e| unavailable(&e))? {
                keys.push(key);
            }
        }

        Ok(keys)
    }
}

fn unavailable(err: &JsValue) -> StorageError {
    StorageError::Unavailable {
        message: format!("{err:?}"),
    }
}

fn write_error(key: &str, err: &JsValue) -> StorageError {
    match err.dyn_ref::<web_sys::DomException>() {
        Some(dom) if dom.name() == "QuotaExceededError" => StorageError::QuotaExceeded {
            key: key.to_string(),
        },
        Some(dom) => StorageError::WriteRejected {
            key: key.to_string(),
            message: dom.message(),
        },
        None => StorageError::WriteRejected {
            key: key.to_string(),
            message: format!("{err:?}"),
        },
    }
}
