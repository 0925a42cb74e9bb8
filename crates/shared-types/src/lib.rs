//! Shared types for the SR2 interactive map user-data layer
//!
//! This crate contains the dataset model shared between the storage,
//! data-manager and wasm-bridge crates: the three persisted datasets, their
//! record shapes, and the composite backup document used for export/import.

pub mod errors;
pub mod events;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "typescript")]
use tsify::Tsify;

pub use errors::{ErrorResponse, FormatError, StorageError, UserDataError, UserDataResult};
pub use events::MapClick;

/// Storage key holding the plot plans array
pub const PLOTS_KEY: &str = "planned_plots";

/// Storage key holding the user pins array
pub const PINS_KEY: &str = "user_pins";

/// Opaque identifier of a discovered collectable
pub type Identifier = Value;

/// One of the independently persisted user datasets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "typescript", derive(Tsify))]
#[cfg_attr(feature = "typescript", tsify(from_wasm_abi))]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Plots,
    Pins,
    Found,
}

impl Dataset {
    /// All datasets in write order
    pub const ALL: [Dataset; 3] = [Dataset::Plots, Dataset::Pins, Dataset::Found];

    /// Field name of this dataset inside a composite backup
    pub fn backup_field(&self) -> &'static str {
        match self {
            Dataset::Plots => "plots",
            Dataset::Pins => "pins",
            Dataset::Found => "found",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backup_field())
    }
}

/// Set of datasets the user picked for an export/import/clear action.
///
/// Iteration always yields plots, then pins, then found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetSelection(BTreeSet<Dataset>);

impl DatasetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Dataset::ALL.into_iter().collect()
    }

    pub fn only(dataset: Dataset) -> Self {
        std::iter::once(dataset).collect()
    }

    /// Mirror a selection checkbox: checked inserts, unchecked removes
    pub fn toggle(&mut self, dataset: Dataset, checked: bool) {
        if checked {
            self.0.insert(dataset);
        } else {
            self.0.remove(&dataset);
        }
    }

    pub fn contains(&self, dataset: Dataset) -> bool {
        self.0.contains(&dataset)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Dataset> + '_ {
        self.0.iter().copied()
    }

    /// Human readable list used in confirmation dialogs, e.g. "plots, pins"
    pub fn describe(&self) -> String {
        self.iter()
            .map(|d| d.backup_field())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Dataset> for DatasetSelection {
    fn from_iter<I: IntoIterator<Item = Dataset>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A plot plan for one site. Plan entries are opaque to this layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotPlan {
    pub site: String,
    #[serde(rename = "plotPlans")]
    pub plot_plans: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlotPlan {
    pub fn new(site: impl Into<String>, plot_plans: Vec<Value>) -> Self {
        Self {
            site: site.into(),
            plot_plans,
            extra: Map::new(),
        }
    }
}

/// Identifier of a game map ("sr1", "sr2")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub String);

impl MapId {
    pub fn sr1() -> Self {
        Self("sr1".to_string())
    }

    pub fn sr2() -> Self {
        Self("sr2".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MapId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map coordinate of a pin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A user placed pin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PinRecord {
    pub icon: String,
    pub pos: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<MapId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PinRecord {
    pub fn new(icon: impl Into<String>, pos: Position, dimension: MapId) -> Self {
        Self {
            icon: icon.into(),
            pos,
            dimension: Some(dimension),
            extra: Map::new(),
        }
    }
}

/// The seven found-collectable categories, each persisted under its own key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FoundKey {
    Gordos,
    LockedDoors,
    MapNodes,
    ResearchDrones,
    TreasurePods,
    StabilizingGates,
    ShadowDoors,
}

impl FoundKey {
    pub const ALL: [FoundKey; 7] = [
        FoundKey::Gordos,
        FoundKey::LockedDoors,
        FoundKey::MapNodes,
        FoundKey::ResearchDrones,
        FoundKey::TreasurePods,
        FoundKey::StabilizingGates,
        FoundKey::ShadowDoors,
    ];

    /// Key used in persistent storage and in exported found objects
    pub fn storage_key(&self) -> &'static str {
        match self {
            FoundKey::Gordos => "gordos",
            FoundKey::LockedDoors => "locked_doors",
            FoundKey::MapNodes => "map_nodes",
            FoundKey::ResearchDrones => "research_drones",
            FoundKey::TreasurePods => "treasure_pods",
            FoundKey::StabilizingGates => "stabilizing_gates",
            FoundKey::ShadowDoors => "shadow_doors",
        }
    }

    /// Field name of this collection on the in-memory found state
    pub fn state_field(&self) -> &'static str {
        match self {
            FoundKey::Gordos => "found_gordos",
            FoundKey::LockedDoors => "found_locked_doors",
            FoundKey::MapNodes => "found_map_nodes",
            FoundKey::ResearchDrones => "found_research_drones",
            FoundKey::TreasurePods => "found_treasure_pods",
            FoundKey::StabilizingGates => "found_stabilizing_gates",
            FoundKey::ShadowDoors => "found_shadow_doors",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<FoundKey> {
        Self::ALL.into_iter().find(|k| k.storage_key() == key)
    }

    /// Resolve either the storage key or the state field name
    pub fn from_any_name(name: &str) -> Option<FoundKey> {
        Self::ALL
            .into_iter()
            .find(|k| k.storage_key() == name || k.state_field() == name)
    }
}

impl fmt::Display for FoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Partial update of found collections, merged into [`FoundState`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoundPatch(pub BTreeMap<FoundKey, Vec<Identifier>>);

impl FoundPatch {
    /// Patch resetting all seven collections
    pub fn cleared() -> Self {
        Self(FoundKey::ALL.into_iter().map(|k| (k, Vec::new())).collect())
    }

    pub fn insert(&mut self, key: FoundKey, ids: Vec<Identifier>) {
        self.0.insert(key, ids);
    }

    pub fn get(&self, key: FoundKey) -> Option<&Vec<Identifier>> {
        self.0.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = FoundKey> + '_ {
        self.0.keys().copied()
    }
}

/// In-memory found state: the seven collections plus unrelated fields owned
/// by other parts of the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoundState {
    pub collections: BTreeMap<FoundKey, Vec<Identifier>>,
    pub other: Map<String, Value>,
}

impl FoundState {
    pub fn collection(&self, key: FoundKey) -> &[Identifier] {
        self.collections.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Overwrite only the collections named in the patch
    pub fn merge(&mut self, patch: &FoundPatch) {
        for (key, ids) in &patch.0 {
            self.collections.insert(*key, ids.clone());
        }
    }

    /// JSON view keyed by state field names, unrelated fields included
    pub fn to_json(&self) -> Value {
        let mut out = self.other.clone();
        for key in FoundKey::ALL {
            out.insert(
                key.state_field().to_string(),
                Value::Array(self.collection(key).to_vec()),
            );
        }
        Value::Object(out)
    }
}

/// Multi-dataset export/import document. Absent fields are omitted.
///
/// Fields hold the payload verbatim as read from storage so that numbers and
/// unknown fields survive an export unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompositeBackup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plots: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pins: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<Value>,
}

impl CompositeBackup {
    /// Whether a parsed document has the composite shape
    pub fn is_composite(doc: &Value) -> bool {
        doc.as_object().is_some_and(|obj| {
            Dataset::ALL
                .iter()
                .any(|d| obj.contains_key(d.backup_field()))
        })
    }

    pub fn field(&self, dataset: Dataset) -> Option<&Value> {
        match dataset {
            Dataset::Plots => self.plots.as_ref(),
            Dataset::Pins => self.pins.as_ref(),
            Dataset::Found => self.found.as_ref(),
        }
    }

    pub fn set_field(&mut self, dataset: Dataset, value: Value) {
        match dataset {
            Dataset::Plots => self.plots = Some(value),
            Dataset::Pins => self.pins = Some(value),
            Dataset::Found => self.found = Some(value),
        }
    }
}
