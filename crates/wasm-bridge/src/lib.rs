//! WASM bridge for the SR2 interactive map user-data layer
//! Exposes dataset selection, export/import/clear and pin placement to the
//! JavaScript UI, backed by the browser's localStorage.

pub mod browser;

use browser::{BrowserDialogs, BrowserDownload, PageReload};
use js_sys::Function;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sr2map_data::{
    PinPlacementController, SetterError, StateSetters, SyncBridge, UiState, UserDataConfig,
    UserDataManager,
};
use sr2map_shared::{
    Dataset, DatasetSelection, ErrorResponse, FoundPatch, MapClick, MapId, UserDataError,
    UserDataResult,
};
use sr2map_storage::PersistedStore;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Route `log` output to the browser console
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    let level = level
        .parse::<log::Level>()
        .map_err(|e| JsValue::from_str(&format!("Invalid log level {level}: {e}")))?;
    console_log::init_with_level(level).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct UserDataApi {
    manager: UserDataManager,
    selection: DatasetSelection,
    pins: PinPlacementController,
    state: UiState,
}

#[wasm_bindgen]
impl UserDataApi {
    /// Create the API over `localStorage`.
    ///
    /// Each callback, when given, receives direct updates for its dataset;
    /// datasets without one are reconciled by reloading the page.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: Option<String>,
        on_plots: Option<Function>,
        on_pins: Option<Function>,
        on_found: Option<Function>,
    ) -> Result<UserDataApi, JsValue> {
        let config = match config_json {
            Some(json) => {
                UserDataConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            None => UserDataConfig::default(),
        };

        let store = PersistedStore::local_storage();
        let state = UiState::load(&store);
        let setters = js_setters(&state, on_plots, on_pins, on_found);
        let sync = SyncBridge::new(setters, Rc::new(PageReload));
        let manager = UserDataManager::new(
            store.clone(),
            sync,
            Rc::new(BrowserDownload),
            Rc::new(BrowserDialogs),
            config,
        );

        log::info!("User data API ready");
        Ok(Self {
            manager,
            selection: DatasetSelection::new(),
            pins: PinPlacementController::new(state.pins.clone(), store),
            state,
        })
    }

    /// Replace the configuration from JSON
    #[wasm_bindgen(js_name = updateConfig)]
    pub fn update_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        match UserDataConfig::from_json(config_json) {
            Ok(config) => {
                self.manager.set_config(config);
                log::info!("Configuration updated successfully");
                Ok(())
            }
            Err(e) => {
                log::error!("Error: {e}");
                Err(JsValue::from_str(&e.to_string()))
            }
        }
    }

    #[wasm_bindgen(js_name = toggleDataset)]
    pub fn toggle_dataset(&mut self, dataset: Dataset, checked: bool) {
        self.selection.toggle(dataset, checked);
    }

    /// Selected dataset names as a JSON array
    #[wasm_bindgen(js_name = selectedDatasets)]
    pub fn selected_datasets(&self) -> String {
        serde_json::to_string(&self.selection).unwrap_or_else(|_| "[]".to_string())
    }

    /// Download the selected datasets. Resolves to false if nothing ran.
    #[wasm_bindgen(js_name = exportSelected)]
    pub fn export_selected(&self) -> Result<bool, JsValue> {
        to_js(self.manager.export_selected(&self.selection)).map(|r| r.is_some())
    }

    #[wasm_bindgen(js_name = exportDataset)]
    pub fn export_dataset(&self, dataset: Dataset) -> Result<bool, JsValue> {
        to_js(self.manager.export_dataset(dataset)).map(|r| r.is_some())
    }

    /// Import a picked file into the selected datasets.
    ///
    /// Returns a JSON report, or null if the user declined.
    #[wasm_bindgen(js_name = importSelected)]
    pub async fn import_selected(&self, file: web_sys::File) -> Result<JsValue, JsValue> {
        let text = match browser::read_file_text(&file).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to read {}: {e}", file.name());
                return Err(error_to_js(e, "import"));
            }
        };

        let report = to_js(self.manager.import_selected(&self.selection, &text))?;
        Ok(match report {
            Some(report) => JsValue::from_str(
                &json!({
                    "written": report.written,
                    "found_keys": report.found_keys,
                    "rejected": report.rejected,
                })
                .to_string(),
            ),
            None => JsValue::NULL,
        })
    }

    #[wasm_bindgen(js_name = clearSelected)]
    pub fn clear_selected(&self) -> Result<bool, JsValue> {
        to_js(self.manager.clear_selected(&self.selection)).map(|r| r.is_some())
    }

    #[wasm_bindgen(js_name = armPin)]
    pub fn arm_pin(&mut self, icon: &str) {
        self.pins.arm(icon);
    }

    #[wasm_bindgen(js_name = disarmPin)]
    pub fn disarm_pin(&mut self) {
        self.pins.disarm();
    }

    /// Handle a map click in map coordinates. Returns the new pin or null.
    #[wasm_bindgen(js_name = mapClicked)]
    pub fn map_clicked(&mut self, x: f64, y: f64, map: &str) -> Result<JsValue, JsValue> {
        let click = MapClick::new(x, y, MapId::from(map));
        match self.pins.on_map_click(&click) {
            Ok(Some(pin)) => to_js_value(&pin),
            Ok(None) => Ok(JsValue::NULL),
            Err(e) => Err(error_to_js(e.into(), "place pin")),
        }
    }

    #[wasm_bindgen]
    pub fn pins(&self) -> Result<JsValue, JsValue> {
        to_js_value(&*self.state.pins.borrow())
    }

    #[wasm_bindgen]
    pub fn plots(&self) -> Result<JsValue, JsValue> {
        to_js_value(&*self.state.plots.borrow())
    }

    /// Found collections keyed by state field name
    #[wasm_bindgen]
    pub fn found(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.state.found.borrow().to_json())
    }
}

/// Cancellation is not an error for the UI; it resolves to `None`
fn to_js<T>(result: UserDataResult<T>) -> Result<Option<T>, JsValue> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(UserDataError::Cancelled) => Ok(None),
        Err(e) => Err(JsValue::from_str(&ErrorResponse::new(e).to_json())),
    }
}

fn error_to_js(error: UserDataError, action: &str) -> JsValue {
    JsValue::from_str(&ErrorResponse::new(error).with_action(action).to_json())
}

fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn call_js<T: Serialize + ?Sized>(f: &Function, value: &T) -> Result<(), SetterError> {
    let arg = to_js_value(value).map_err(|e| SetterError(format!("{e:?}")))?;
    f.call1(&JsValue::NULL, &arg)
        .map(|_| ())
        .map_err(|e| SetterError(format!("{e:?}")))
}

fn found_patch_json(patch: &FoundPatch) -> Value {
    let fields: Map<String, Value> = patch
        .0
        .iter()
        .map(|(key, ids)| (key.state_field().to_string(), Value::Array(ids.clone())))
        .collect();
    Value::Object(fields)
}

/// Setters that update the Rust mirror after the JS callback accepted the
/// value. `None` when no callback was supplied at all.
fn js_setters(
    state: &UiState,
    on_plots: Option<Function>,
    on_pins: Option<Function>,
    on_found: Option<Function>,
) -> Option<StateSetters> {
    if on_plots.is_none() && on_pins.is_none() && on_found.is_none() {
        return None;
    }

    let mut setters = StateSetters::new();
    if let Some(f) = on_plots {
        let plots = state.plots.clone();
        setters = setters.with_plots(move |v| {
            call_js(&f, &v)?;
            *plots.try_borrow_mut().map_err(|e| SetterError(e.to_string()))? = v;
            Ok(())
        });
    }
    if let Some(f) = on_pins {
        let pins = state.pins.clone();
        setters = setters.with_pins(move |v| {
            call_js(&f, &v)?;
            *pins.try_borrow_mut().map_err(|e| SetterError(e.to_string()))? = v;
            Ok(())
        });
    }
    if let Some(f) = on_found {
        let found = state.found.clone();
        setters = setters.with_found(move |patch| {
            call_js(&f, &found_patch_json(&patch))?;
            found
                .try_borrow_mut()
                .map_err(|e| SetterError(e.to_string()))?
                .merge(&patch);
            Ok(())
        });
    }
    Some(setters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr2map_shared::FoundKey;

    #[test]
    fn test_found_patch_uses_state_field_names() {
        let mut patch = FoundPatch::default();
        patch.insert(FoundKey::ShadowDoors, vec![json!("s1")]);

        assert_eq!(
            found_patch_json(&patch),
            json!({"found_shadow_doors": ["s1"]})
        );
        assert_eq!(
            found_patch_json(&FoundPatch::cleared()).as_object().map(Map::len),
            Some(7)
        );
    }

    #[test]
    fn test_no_callbacks_means_full_reload() {
        let state = UiState::default();
        assert!(js_setters(&state, None, None, None).is_none());
    }
}
