//! mc-core: Shared types, traits, and utilities for MemCue
//!
//! Position units, the marker model and the track-side `MarkerStore`
//! contract used by the cache and the navigator.

mod error;
mod marker;
mod time;

pub use error::*;
pub use marker::*;
pub use time::*;

/// Standard sample rate options
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum SampleRate {
    Hz44100 = 44100,
    Hz48000 = 48000,
    Hz88200 = 88200,
    Hz96000 = 96000,
    Hz176400 = 176400,
    Hz192000 = 192000,
}

impl SampleRate {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Standard rate matching `hz`, if any
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            44100 => Some(Self::Hz44100),
            48000 => Some(Self::Hz48000),
            88200 => Some(Self::Hz88200),
            96000 => Some(Self::Hz96000),
            176400 => Some(Self::Hz176400),
            192000 => Some(Self::Hz192000),
            _ => None,
        }
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Hz48000
    }
}
