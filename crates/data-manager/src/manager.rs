//! User-data manager: export, import and clear over a dataset selection

use crate::codec::{self, ExportedFile, FileSink, ImportReport};
use crate::config::UserDataConfig;
use crate::sync::{StateUpdate, SyncBridge, SyncReport};
use serde_json::Value;
use sr2map_shared::{
    Dataset, DatasetSelection, FoundKey, FoundPatch, StorageError, UserDataError, UserDataResult,
    PINS_KEY, PLOTS_KEY,
};
use sr2map_storage::PersistedStore;
use std::rc::Rc;

/// Blocking dialogs shown to the user
pub trait Prompter {
    fn confirm(&self, message: &str) -> bool;

    fn alert(&self, message: &str);
}

pub struct UserDataManager {
    store: PersistedStore,
    sync: SyncBridge,
    sink: Rc<dyn FileSink>,
    prompter: Rc<dyn Prompter>,
    config: UserDataConfig,
}

impl UserDataManager {
    pub fn new(
        store: PersistedStore,
        sync: SyncBridge,
        sink: Rc<dyn FileSink>,
        prompter: Rc<dyn Prompter>,
        config: UserDataConfig,
    ) -> Self {
        Self {
            store,
            sync,
            sink,
            prompter,
            config,
        }
    }

    pub fn store(&self) -> &PersistedStore {
        &self.store
    }

    pub fn config(&self) -> &UserDataConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: UserDataConfig) {
        self.config = config;
    }

    /// Download the selected datasets as one composite backup
    pub fn export_selected(&self, selection: &DatasetSelection) -> UserDataResult<ExportedFile> {
        let result = codec::export_selection(&self.store, selection, &self.config.filenames)
            .and_then(|file| {
                self.sink.save(&file)?;
                Ok(file)
            });
        self.finish("Export", result)
    }

    /// Download one dataset's bare payload
    pub fn export_dataset(&self, dataset: Dataset) -> UserDataResult<ExportedFile> {
        let result = codec::export_dataset(&self.store, dataset, &self.config.filenames)
            .and_then(|file| {
                self.sink.save(&file)?;
                Ok(file)
            });
        self.finish("Export", result)
    }

    /// Import uploaded text into the selected datasets, then reload
    pub fn import_selected(
        &self,
        selection: &DatasetSelection,
        text: &str,
    ) -> UserDataResult<ImportReport> {
        if selection.is_empty() {
            return self.finish("Import", Err(UserDataError::EmptySelection));
        }
        let question = format!(
            "This will overwrite current {}. Continue?",
            selection.describe()
        );
        if !self.prompter.confirm(&question) {
            return Err(UserDataError::Cancelled);
        }

        let result = codec::import_document(
            &self.store,
            selection,
            text,
            self.config.found_validation,
        );
        let report = self.finish("Import", result)?;

        if !report.rejected.is_empty() {
            let skipped = report
                .rejected
                .iter()
                .map(|e| e.dataset.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            log::error!("Import skipped invalid data: {:?}", report.rejected);
            self.prompter.alert(&format!(
                "Import failed for {skipped}: invalid format. Other datasets were imported."
            ));
        }

        if !report.wrote_anything() && report.rejected.is_empty() {
            log::info!("Import found no data for {}", selection.describe());
            self.prompter
                .alert(&format!("Nothing to import for {}.", selection.describe()));
        }

        if report.wrote_anything() && self.config.reload_after_import {
            self.sync.reload();
        }
        Ok(report)
    }

    /// Reset the selected datasets to empty after confirmation
    pub fn clear_selected(&self, selection: &DatasetSelection) -> UserDataResult<SyncReport> {
        if selection.is_empty() {
            return self.finish("Clear", Err(UserDataError::EmptySelection));
        }
        let question = format!(
            "Are you sure you want to clear {}? This cannot be undone.",
            selection.describe()
        );
        if !self.prompter.confirm(&question) {
            return Err(UserDataError::Cancelled);
        }

        let updates = self.finish("Clear", clear_datasets(&self.store, selection).map_err(Into::into))?;
        let report = self.sync.reconcile_all(updates);
        log::info!("Cleared {}", selection.describe());
        Ok(report)
    }

    fn finish<T>(&self, action: &str, result: UserDataResult<T>) -> UserDataResult<T> {
        if let Err(e) = &result {
            match e {
                UserDataError::Cancelled => {}
                UserDataError::EmptySelection => {
                    self.prompter.alert("Select at least one dataset first.");
                }
                _ => {
                    log::error!("{action} failed: {e}");
                    self.prompter
                        .alert(&format!("{action} failed. Check console for details."));
                }
            }
        }
        result
    }
}

/// Write empty values for the selected datasets.
///
/// Returns the state updates that mirror the writes. Found clearing resets
/// all seven keys and yields a patch rather than a replacement so unrelated
/// found-state fields survive.
pub fn clear_datasets(
    store: &PersistedStore,
    selection: &DatasetSelection,
) -> Result<Vec<StateUpdate>, StorageError> {
    let mut updates = Vec::new();
    let empty = Value::Array(Vec::new());

    for dataset in selection.iter() {
        match dataset {
            Dataset::Plots => {
                store.write_value(PLOTS_KEY, &empty)?;
                updates.push(StateUpdate::Plots(Vec::new()));
            }
            Dataset::Pins => {
                store.write_value(PINS_KEY, &empty)?;
                updates.push(StateUpdate::Pins(Vec::new()));
            }
            Dataset::Found => {
                for key in FoundKey::ALL {
                    store.write_value(key.storage_key(), &empty)?;
                }
                updates.push(StateUpdate::Found(FoundPatch::cleared()));
            }
        }
    }
    Ok(updates)
}
