//! Browser-only tests for the localStorage backend
#![cfg(target_arch = "wasm32")]

use serde_json::json;
use sr2map_shared::PINS_KEY;
use sr2map_storage::{KeyValueStore, PersistedStore, SimpleStorage};
use std::rc::Rc;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_session_storage_round_trip() {
    let backend = Rc::new(SimpleStorage::session());
    backend.clear().unwrap();

    let store = PersistedStore::new(backend.clone());
    let pins = json!([{"icon": "a", "pos": {"x": 1, "y": 2}, "dimension": "sr2"}]);
    store.write_value(PINS_KEY, &pins).unwrap();

    assert_eq!(store.read_value(PINS_KEY, json!([])), pins);
    assert!(backend.keys().unwrap().contains(&PINS_KEY.to_string()));
}

#[wasm_bindgen_test]
fn test_missing_key_is_empty() {
    let backend = Rc::new(SimpleStorage::session());
    backend.clear().unwrap();

    let store = PersistedStore::new(backend);
    assert!(store.read_pins().is_empty());
}
