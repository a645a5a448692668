//! Trigger controls exposed to the UI / controller mapping layer
//!
//! Each control is a push button: a value above zero fires it, anything else
//! (including the button release) is ignored.

use mc_core::{McError, McResult};
use std::fmt;
use std::str::FromStr;

use crate::navigator::MarkerNavigator;

/// Trigger control names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    SeekNextMarker,
    SeekPreviousMarker,
    SeekPreviousMarkerWithSkip,
    MemoryCreateAtCurrent,
    MemoryClearAll,
    MemoryClearNearest,
    MemoryClearBefore,
    MemoryClearAfter,
}

impl ControlKey {
    pub const ALL: [Self; 8] = [
        Self::SeekNextMarker,
        Self::SeekPreviousMarker,
        Self::SeekPreviousMarkerWithSkip,
        Self::MemoryCreateAtCurrent,
        Self::MemoryClearAll,
        Self::MemoryClearNearest,
        Self::MemoryClearBefore,
        Self::MemoryClearAfter,
    ];

    /// Control name as used in mappings
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeekNextMarker => "seek_next_marker",
            Self::SeekPreviousMarker => "seek_previous_marker",
            Self::SeekPreviousMarkerWithSkip => "seek_previous_marker_with_skip",
            Self::MemoryCreateAtCurrent => "memory_create_at_current",
            Self::MemoryClearAll => "memory_clear_all",
            Self::MemoryClearNearest => "memory_clear_nearest",
            Self::MemoryClearBefore => "memory_clear_before",
            Self::MemoryClearAfter => "memory_clear_after",
        }
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlKey {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| McError::UnknownControl(s.to_string()))
    }
}

/// Routes trigger controls of one deck to its navigator
pub struct DeckControls {
    navigator: MarkerNavigator,
}

impl DeckControls {
    pub fn new(navigator: MarkerNavigator) -> Self {
        Self { navigator }
    }

    pub fn navigator(&self) -> &MarkerNavigator {
        &self.navigator
    }

    /// Fire `key` if `value > 0`. Returns whether anything changed
    /// (a seek was issued or a marker created/removed).
    pub fn trigger(&self, key: ControlKey, value: f64) -> bool {
        if value <= 0.0 || value.is_nan() {
            return false;
        }
        let nav = &self.navigator;
        match key {
            ControlKey::SeekNextMarker => nav.seek_to_next_marker().is_some(),
            ControlKey::SeekPreviousMarker => nav.seek_to_previous_marker().is_some(),
            ControlKey::SeekPreviousMarkerWithSkip => {
                nav.seek_to_previous_marker_with_skip().is_some()
            }
            ControlKey::MemoryCreateAtCurrent => nav.create_at_current_position().is_some(),
            ControlKey::MemoryClearAll => nav.clear_all(),
            ControlKey::MemoryClearNearest => nav.clear_nearest_to_current_position(),
            ControlKey::MemoryClearBefore => nav.clear_nearest_before_current_position(),
            ControlKey::MemoryClearAfter => nav.clear_nearest_after_current_position(),
        }
    }

    /// Fire a control by mapping name
    pub fn trigger_by_name(&self, name: &str, value: f64) -> McResult<bool> {
        let key: ControlKey = name.parse()?;
        Ok(self.trigger(key, value))
    }
}
