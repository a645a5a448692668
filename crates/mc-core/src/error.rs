//! Error types for MemCue

use thiserror::Error;

use crate::MarkerId;

/// Core error type
#[derive(Error, Debug)]
pub enum McError {
    #[error("No track loaded")]
    NoTrack,

    #[error("Play position unavailable (duration or sample rate unknown)")]
    PositionUnavailable,

    #[error("Invalid position: {0}")]
    InvalidPosition(f64),

    #[error("Memory marker already exists at engine sample {0}")]
    DuplicatePosition(f64),

    #[error("Marker not found: {0}")]
    MarkerNotFound(MarkerId),

    #[error("Track is locked")]
    TrackLocked,

    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type McResult<T> = Result<T, McError>;
