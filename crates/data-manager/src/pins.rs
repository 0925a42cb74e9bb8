//! Pin placement from map clicks

use serde_json::Value;
use sr2map_shared::{MapClick, PinRecord, StorageError, PINS_KEY};
use sr2map_storage::PersistedStore;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementState {
    Idle,
    /// The next map click places a pin with this icon
    Armed { icon: String },
}

/// Appends a pin to memory and storage for each click while armed
pub struct PinPlacementController {
    state: PlacementState,
    pins: Rc<RefCell<Vec<PinRecord>>>,
    store: PersistedStore,
}

impl PinPlacementController {
    pub fn new(pins: Rc<RefCell<Vec<PinRecord>>>, store: PersistedStore) -> Self {
        Self {
            state: PlacementState::Idle,
            pins,
            store,
        }
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn arm(&mut self, icon: impl Into<String>) {
        let icon = icon.into();
        log::debug!("Pin placement armed with {icon}");
        self.state = PlacementState::Armed { icon };
    }

    pub fn disarm(&mut self) {
        self.state = PlacementState::Idle;
    }

    /// Handle a click. Returns the placed pin, or `None` when idle.
    ///
    /// The in-memory sequence is extended first. Storage gets the pin
    /// appended to the stored array as it is, so existing entries keep their
    /// exact JSON. If the write fails the pin stays in memory only.
    pub fn on_map_click(&mut self, click: &MapClick) -> Result<Option<PinRecord>, StorageError> {
        let PlacementState::Armed { icon } = &self.state else {
            return Ok(None);
        };

        let pin = PinRecord::new(icon.clone(), click.pos, click.map.clone());
        self.pins.borrow_mut().push(pin.clone());

        let entry = serde_json::to_value(&pin).map_err(|e| StorageError::Serialize {
            key: PINS_KEY.to_string(),
            message: e.to_string(),
        })?;
        let mut stored = match self.store.read_value(PINS_KEY, Value::Array(Vec::new())) {
            Value::Array(items) => items,
            other => {
                log::warn!("{PINS_KEY} holds {other} instead of an array, starting over");
                Vec::new()
            }
        };
        stored.push(entry);
        self.store.write_value(PINS_KEY, &Value::Array(stored))?;

        log::info!(
            "Placed {} pin at ({}, {}) on {}",
            pin.icon,
            pin.pos.x,
            pin.pos.y,
            click.map
        );
        Ok(Some(pin))
    }
}
