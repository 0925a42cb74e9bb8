//! Map interaction events, independent of the mapping library in use

use crate::{MapId, Position};
use serde::{Deserialize, Serialize};

/// The user clicked somewhere on the map.
///
/// `pos` is already in map coordinates; `map` is the map that was active
/// when the click happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapClick {
    pub pos: Position,
    pub map: MapId,
}

impl MapClick {
    pub fn new(x: f64, y: f64, map: MapId) -> Self {
        Self {
            pos: Position::new(x, y),
            map,
        }
    }
}
