//! Marker navigation preferences
//!
//! Persisted as JSON next to the other per-user settings. Loading never
//! fails: a missing or malformed file yields defaults.

use mc_core::{McError, McResult, SampleRate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Marker navigation preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerPreferences {
    /// "Previous with skip" passes over markers closer than this (seconds)
    pub skip_window_secs: f64,
    /// Distance (engine samples) within which the UI treats the playhead
    /// as sitting on a marker
    pub probe_tolerance: f64,
    /// Sample rate assumed until the engine reports one
    pub default_sample_rate: u32,
    /// Pending seek requests before new ones are dropped
    pub seek_queue_capacity: usize,
}

impl Default for MarkerPreferences {
    fn default() -> Self {
        Self {
            skip_window_secs: 1.5,
            probe_tolerance: 50_000.0, // about half a second at 44.1 kHz stereo
            default_sample_rate: SampleRate::default().as_u32(),
            seek_queue_capacity: 64,
        }
    }
}

impl MarkerPreferences {
    /// Load preferences from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load preferences from specified path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed preferences {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to standard location
    pub fn save(&self) -> McResult<()> {
        self.save_to(Self::default_path())
    }

    /// Save preferences to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> McResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json =
            serde_json::to_string_pretty(self).map_err(|e| McError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Get default preferences file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("memcue"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("markers.json")
    }

    /// Replace out-of-range values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.skip_window_secs.is_finite() || self.skip_window_secs < 0.0 {
            self.skip_window_secs = defaults.skip_window_secs;
        }
        if !self.probe_tolerance.is_finite() || self.probe_tolerance <= 0.0 {
            self.probe_tolerance = defaults.probe_tolerance;
        }
        if self.default_sample_rate == 0 {
            self.default_sample_rate = defaults.default_sample_rate;
        }
        if self.seek_queue_capacity == 0 {
            self.seek_queue_capacity = defaults.seek_queue_capacity;
        }
        self
    }
}
