//! User-data manager crate for the SR2 interactive map
//! Keeps in-memory UI state consistent with persisted storage across the
//! plots, pins and found datasets, and handles export/import/clear.

pub mod codec;
pub mod config;
pub mod manager;
pub mod pins;
pub mod sync;
pub mod validator;

pub use codec::{ExportedFile, FileSink, ImportReport};
pub use config::{ConfigError, ExportFilenames, UserDataConfig};
pub use manager::{clear_datasets, Prompter, UserDataManager};
pub use pins::{PinPlacementController, PlacementState};
pub use sync::{
    DirectPatch, FullReload, Reloader, SetterError, StateReconciler, StateReinit, StateSetters,
    StateUpdate, SyncBridge, SyncOutcome, SyncReport, UiState,
};
pub use validator::{
    is_valid_found_export, is_valid_pins_export, is_valid_plots_export, FoundValidation,
};
