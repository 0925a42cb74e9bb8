//! Export and import of user datasets as JSON documents
//!
//! Exports read payloads verbatim from the store. Imports parse untrusted
//! text, validate each dataset independently and write only what was both
//! requested and valid. Writes go out in the order plots, pins, found and
//! are not transactional: a failing write leaves earlier ones in place.

use crate::config::ExportFilenames;
use crate::validator::{self, FoundValidation};
use serde_json::Value;
use sr2map_shared::{
    CompositeBackup, Dataset, DatasetSelection, FormatError, FoundKey, UserDataError,
    UserDataResult, PINS_KEY, PLOTS_KEY,
};
use sr2map_storage::PersistedStore;

/// Receives finished export documents, e.g. as a browser download
pub trait FileSink {
    fn save(&self, file: &ExportedFile) -> UserDataResult<()>;
}

/// A serialized export ready to be handed to a [`FileSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub contents: String,
}

/// What an import wrote and what it skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub written: Vec<Dataset>,
    pub found_keys: Vec<FoundKey>,
    pub rejected: Vec<FormatError>,
}

impl ImportReport {
    pub fn wrote_anything(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Build a backup holding exactly the selected datasets
pub fn build_backup(store: &PersistedStore, selection: &DatasetSelection) -> UserDataResult<CompositeBackup> {
    if selection.is_empty() {
        return Err(UserDataError::EmptySelection);
    }

    let mut backup = CompositeBackup::default();
    for dataset in selection.iter() {
        backup.set_field(dataset, store.read_dataset_value(dataset));
    }
    Ok(backup)
}

/// Serialize the selected datasets into one composite backup file
pub fn export_selection(
    store: &PersistedStore,
    selection: &DatasetSelection,
    filenames: &ExportFilenames,
) -> UserDataResult<ExportedFile> {
    let backup = build_backup(store, selection)?;
    Ok(ExportedFile {
        filename: filenames.backup.clone(),
        contents: serde_json::to_string_pretty(&backup)?,
    })
}

/// Serialize a single dataset's bare payload under its own filename
pub fn export_dataset(
    store: &PersistedStore,
    dataset: Dataset,
    filenames: &ExportFilenames,
) -> UserDataResult<ExportedFile> {
    let filename = match dataset {
        Dataset::Plots => &filenames.plots,
        Dataset::Pins => &filenames.pins,
        Dataset::Found => &filenames.found,
    };
    Ok(ExportedFile {
        filename: filename.clone(),
        contents: serde_json::to_string_pretty(&store.read_dataset_value(dataset))?,
    })
}

/// Parse uploaded text. Empty input counts as a parse failure.
pub fn parse_document(text: &str) -> UserDataResult<Value> {
    if text.trim().is_empty() {
        return Err(UserDataError::Parse {
            message: "Empty file".to_string(),
        });
    }
    Ok(serde_json::from_str(text)?)
}

/// Import a document into the selected datasets.
///
/// A composite document merges: each field is written only if present,
/// selected and valid, and invalid fields are reported without stopping the
/// others. Any other document is a bare payload for the one selected
/// dataset and fails as a whole if invalid.
pub fn import_document(
    store: &PersistedStore,
    selection: &DatasetSelection,
    text: &str,
    mode: FoundValidation,
) -> UserDataResult<ImportReport> {
    if selection.is_empty() {
        return Err(UserDataError::EmptySelection);
    }

    let doc = parse_document(text)?;
    let mut report = ImportReport::default();

    if CompositeBackup::is_composite(&doc) {
        let backup: CompositeBackup = serde_json::from_value(doc)?;
        for dataset in selection.iter() {
            let payload = match backup.field(dataset) {
                Some(Value::Null) | None => continue,
                Some(payload) => payload,
            };

            if let Err(e) = validator::validate(dataset, payload, mode) {
                log::warn!("Skipping {dataset} from backup: {e}");
                report.rejected.push(e);
                continue;
            }
            write_payload(store, dataset, payload, &mut report)?;
        }
    } else {
        let dataset = single_target(selection)?;
        validator::validate(dataset, &doc, mode)?;
        write_payload(store, dataset, &doc, &mut report)?;
    }

    log::info!(
        "Imported {:?} ({} rejected)",
        report.written,
        report.rejected.len()
    );
    Ok(report)
}

fn single_target(selection: &DatasetSelection) -> UserDataResult<Dataset> {
    let mut iter = selection.iter();
    match (iter.next(), iter.next()) {
        (Some(dataset), None) => Ok(dataset),
        (Some(dataset), Some(_)) => Err(FormatError::new(
            dataset,
            format!(
                "a single-dataset file needs exactly one dataset selected, got {}",
                selection.describe()
            ),
        )
        .into()),
        (None, _) => Err(UserDataError::EmptySelection),
    }
}

fn write_payload(
    store: &PersistedStore,
    dataset: Dataset,
    payload: &Value,
    report: &mut ImportReport,
) -> UserDataResult<()> {
    match dataset {
        Dataset::Plots => store.write_value(PLOTS_KEY, payload)?,
        Dataset::Pins => store.write_value(PINS_KEY, payload)?,
        Dataset::Found => {
            let Some(obj) = payload.as_object() else {
                return Ok(());
            };
            let mut wrote = false;
            for (name, ids) in obj {
                if let Some(key) = FoundKey::from_any_name(name) {
                    store.write_value(key.storage_key(), ids)?;
                    if !report.found_keys.contains(&key) {
                        report.found_keys.push(key);
                    }
                    wrote = true;
                }
            }
            if !wrote {
                return Ok(());
            }
        }
    }

    report.written.push(dataset);
    Ok(())
}
