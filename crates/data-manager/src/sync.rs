//! State reconciliation after storage mutations
//!
//! The in-memory UI state is a cache of the persisted store. After a write,
//! a [`StateReconciler`] either patches the cache directly through a setter
//! ([`DirectPatch`]) or asks for a full reload ([`FullReload`]). A reload
//! re-derives every dataset from storage and is always safe; a direct patch
//! only applies when a live setter exists for the dataset and succeeds.

use sr2map_shared::{Dataset, FoundPatch, FoundState, PinRecord, PlotPlan};
use sr2map_storage::PersistedStore;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

/// New value for one dataset's in-memory state
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Plots(Vec<PlotPlan>),
    Pins(Vec<PinRecord>),
    /// Merged into the found state; collections not named are kept
    Found(FoundPatch),
}

impl StateUpdate {
    pub fn dataset(&self) -> Dataset {
        match self {
            StateUpdate::Plots(_) => Dataset::Plots,
            StateUpdate::Pins(_) => Dataset::Pins,
            StateUpdate::Found(_) => Dataset::Found,
        }
    }
}

/// A state setter rejected an update
#[derive(Error, Debug, Clone, PartialEq)]
#[error("State update failed: {0}")]
pub struct SetterError(pub String);

pub type Setter<T> = Box<dyn Fn(T) -> Result<(), SetterError>>;

/// Live setters for the datasets the UI currently holds in memory
#[derive(Default)]
pub struct StateSetters {
    pub plots: Option<Setter<Vec<PlotPlan>>>,
    pub pins: Option<Setter<Vec<PinRecord>>>,
    pub found: Option<Setter<FoundPatch>>,
}

impl StateSetters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plots(mut self, f: impl Fn(Vec<PlotPlan>) -> Result<(), SetterError> + 'static) -> Self {
        self.plots = Some(Box::new(f));
        self
    }

    pub fn with_pins(mut self, f: impl Fn(Vec<PinRecord>) -> Result<(), SetterError> + 'static) -> Self {
        self.pins = Some(Box::new(f));
        self
    }

    pub fn with_found(mut self, f: impl Fn(FoundPatch) -> Result<(), SetterError> + 'static) -> Self {
        self.found = Some(Box::new(f));
        self
    }

    pub fn has(&self, dataset: Dataset) -> bool {
        match dataset {
            Dataset::Plots => self.plots.is_some(),
            Dataset::Pins => self.pins.is_some(),
            Dataset::Found => self.found.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// In-memory state now matches storage
    Patched,
    /// Only a full reload can bring memory back in line
    ReloadRequired,
}

/// Brings in-memory state in line with storage after a write
pub trait StateReconciler {
    fn reconcile(&self, update: StateUpdate) -> SyncOutcome;
}

/// Re-derives all application state from storage
pub trait Reloader {
    fn reload(&self);
}

/// Patch state through the dataset's setter, falling back to a reload
pub struct DirectPatch {
    setters: StateSetters,
}

impl DirectPatch {
    pub fn new(setters: StateSetters) -> Self {
        Self { setters }
    }
}

impl StateReconciler for DirectPatch {
    fn reconcile(&self, update: StateUpdate) -> SyncOutcome {
        let dataset = update.dataset();
        let result = match (update, &self.setters) {
            (StateUpdate::Plots(v), StateSetters { plots: Some(set), .. }) => set(v),
            (StateUpdate::Pins(v), StateSetters { pins: Some(set), .. }) => set(v),
            (StateUpdate::Found(p), StateSetters { found: Some(set), .. }) => set(p),
            _ => {
                log::debug!("No setter for {dataset}, reload required");
                return SyncOutcome::ReloadRequired;
            }
        };

        match result {
            Ok(()) => SyncOutcome::Patched,
            Err(e) => {
                log::warn!("Direct update of {dataset} failed, falling back to reload: {e}");
                SyncOutcome::ReloadRequired
            }
        }
    }
}

/// Always reload
pub struct FullReload;

impl StateReconciler for FullReload {
    fn reconcile(&self, _update: StateUpdate) -> SyncOutcome {
        SyncOutcome::ReloadRequired
    }
}

/// Result of reconciling a batch of updates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub patched: Vec<Dataset>,
    pub reloaded: bool,
}

/// Picks a reconciliation strategy and owns the reloader
pub struct SyncBridge {
    strategy: Box<dyn StateReconciler>,
    reloader: Rc<dyn Reloader>,
}

impl SyncBridge {
    /// Direct patching when setters are supplied, full reload otherwise
    pub fn new(setters: Option<StateSetters>, reloader: Rc<dyn Reloader>) -> Self {
        let strategy: Box<dyn StateReconciler> = match setters {
            Some(setters) => Box::new(DirectPatch::new(setters)),
            None => Box::new(FullReload),
        };
        Self::with_strategy(strategy, reloader)
    }

    pub fn with_strategy(strategy: Box<dyn StateReconciler>, reloader: Rc<dyn Reloader>) -> Self {
        Self { strategy, reloader }
    }

    /// Reconcile every update, reloading at most once at the end
    pub fn reconcile_all(&self, updates: Vec<StateUpdate>) -> SyncReport {
        let mut report = SyncReport::default();
        let mut needs_reload = false;

        for update in updates {
            let dataset = update.dataset();
            match self.strategy.reconcile(update) {
                SyncOutcome::Patched => report.patched.push(dataset),
                SyncOutcome::ReloadRequired => needs_reload = true,
            }
        }

        if needs_reload {
            self.reload();
            report.reloaded = true;
        }
        report
    }

    pub fn reload(&self) {
        log::info!("Reloading application state from storage");
        self.reloader.reload();
    }
}

/// Shared in-memory mirror of the three datasets
#[derive(Clone, Default)]
pub struct UiState {
    pub plots: Rc<RefCell<Vec<PlotPlan>>>,
    pub pins: Rc<RefCell<Vec<PinRecord>>>,
    pub found: Rc<RefCell<FoundState>>,
}

impl UiState {
    /// Derive fresh state from storage
    pub fn load(store: &PersistedStore) -> Self {
        let state = Self::default();
        state.refresh(store);
        state
    }

    /// Re-read every dataset from storage, keeping unrelated found fields
    pub fn refresh(&self, store: &PersistedStore) {
        *self.plots.borrow_mut() = store.read_plots();
        *self.pins.borrow_mut() = store.read_pins();

        let mut found = self.found.borrow_mut();
        for key in sr2map_shared::FoundKey::ALL {
            found.collections.insert(key, store.read_found_key(key));
        }
    }

    /// Setters writing into this state. Fails if the state is borrowed.
    pub fn setters(&self) -> StateSetters {
        let plots = self.plots.clone();
        let pins = self.pins.clone();
        let found = self.found.clone();

        StateSetters::new()
            .with_plots(move |v| {
                *plots.try_borrow_mut().map_err(|e| SetterError(e.to_string()))? = v;
                Ok(())
            })
            .with_pins(move |v| {
                *pins.try_borrow_mut().map_err(|e| SetterError(e.to_string()))? = v;
                Ok(())
            })
            .with_found(move |patch| {
                found
                    .try_borrow_mut()
                    .map_err(|e| SetterError(e.to_string()))?
                    .merge(&patch);
                Ok(())
            })
    }
}

/// Native stand-in for a page reload: refreshes a [`UiState`] from storage
pub struct StateReinit {
    state: UiState,
    store: PersistedStore,
    count: Cell<usize>,
}

impl StateReinit {
    pub fn new(state: UiState, store: PersistedStore) -> Self {
        Self {
            state,
            store,
            count: Cell::new(0),
        }
    }

    /// How many reloads have happened
    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl Reloader for StateReinit {
    fn reload(&self) {
        self.count.set(self.count.get() + 1);
        self.state.refresh(&self.store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sr2map_shared::{FoundKey, MapId, Position, PINS_KEY};

    fn fixture() -> (PersistedStore, UiState, Rc<StateReinit>) {
        let store = PersistedStore::in_memory();
        let state = UiState::load(&store);
        let reinit = Rc::new(StateReinit::new(state.clone(), store.clone()));
        (store, state, reinit)
    }

    fn pin() -> PinRecord {
        PinRecord::new("a", Position::new(1.5, 2.5), MapId::sr2())
    }

    #[test]
    fn test_direct_patch_updates_state_without_reload() {
        let (_, state, reinit) = fixture();
        let bridge = SyncBridge::new(Some(state.setters()), reinit.clone());

        let report = bridge.reconcile_all(vec![StateUpdate::Pins(vec![pin()])]);

        assert_eq!(report.patched, vec![Dataset::Pins]);
        assert!(!report.reloaded);
        assert_eq!(reinit.count(), 0);
        assert_eq!(*state.pins.borrow(), vec![pin()]);
    }

    #[test]
    fn test_missing_setter_reloads() {
        let (store, state, reinit) = fixture();
        store.write(PINS_KEY, &vec![pin()]).unwrap();

        let setters = StateSetters::new().with_plots(|_| Ok(()));
        let bridge = SyncBridge::new(Some(setters), reinit.clone());
        let report = bridge.reconcile_all(vec![StateUpdate::Pins(vec![pin()])]);

        assert!(report.reloaded);
        assert_eq!(reinit.count(), 1);
        assert_eq!(*state.pins.borrow(), vec![pin()]);
    }

    #[test]
    fn test_failing_setter_falls_back_to_reload() {
        let (_, _, reinit) = fixture();
        let setters = StateSetters::new().with_plots(|_| Err(SetterError("unmounted".into())));
        let bridge = SyncBridge::new(Some(setters), reinit.clone());

        let report = bridge.reconcile_all(vec![StateUpdate::Plots(Vec::new())]);

        assert!(report.patched.is_empty());
        assert!(report.reloaded);
        assert_eq!(reinit.count(), 1);
    }

    #[test]
    fn test_borrowed_state_makes_setter_fail() {
        let (_, state, _) = fixture();
        let setters = state.setters();
        let _guard = state.pins.borrow();

        let outcome = DirectPatch::new(setters).reconcile(StateUpdate::Pins(vec![pin()]));
        assert_eq!(outcome, SyncOutcome::ReloadRequired);
    }

    #[test]
    fn test_full_reload_reloads_once_per_batch() {
        let (_, _, reinit) = fixture();
        let bridge = SyncBridge::new(None, reinit.clone());

        let report = bridge.reconcile_all(vec![
            StateUpdate::Plots(Vec::new()),
            StateUpdate::Pins(Vec::new()),
            StateUpdate::Found(FoundPatch::cleared()),
        ]);

        assert!(report.reloaded);
        assert_eq!(reinit.count(), 1);
    }

    #[test]
    fn test_found_patch_merges() {
        let (_, state, _) = fixture();
        state
            .found
            .borrow_mut()
            .other
            .insert("selected_island".to_string(), json!("ember valley"));

        let mut patch = FoundPatch::default();
        patch.insert(FoundKey::Gordos, vec![json!("g1")]);
        let outcome = DirectPatch::new(state.setters()).reconcile(StateUpdate::Found(patch));

        assert_eq!(outcome, SyncOutcome::Patched);
        let found = state.found.borrow();
        assert_eq!(found.collection(FoundKey::Gordos), &[json!("g1")]);
        assert_eq!(found.other["selected_island"], json!("ember valley"));
    }
}
