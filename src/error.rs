// src/error.rs
//
// Crate-wide error type.

use thiserror::Error;

/// Everything that can go wrong in the piano engine.
///
/// None of these are fatal: the worst outcome of any of them is a missing
/// note or an unsaved take.
#[derive(Error, Debug)]
pub enum PianoError {
    /// Pitch lookup miss. The start intent is rejected and no voice is built.
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    /// Exponential ramps are undefined towards zero or negative targets.
    #[error("exponential ramp target must be positive, got {0}")]
    InvalidRampTarget(f32),

    #[error("a recording session is already active")]
    AlreadyRecording,

    #[error("no recording session is active")]
    NotRecording,

    #[error("no finished recording to export")]
    NoRecording,

    #[error("failed to serialize recording: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The save endpoint could not be parsed into host, port and path.
    #[error("invalid save url '{0}'")]
    InvalidUrl(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PianoResult<T> = Result<T, PianoError>;
