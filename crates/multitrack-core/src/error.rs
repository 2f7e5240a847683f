//! Error types for multitrack-core.

use crate::InstrumentId;
use thiserror::Error;

/// Error type for multitrack-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Instrument {0} not found")]
    InstrumentNotFound(InstrumentId),

    #[error("Invalid note number: {0}. Must be between 0 and 127")]
    InvalidNote(i32),

    #[error("Instrument capacity exceeded (max {max})")]
    CapacityExceeded { max: usize },

    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    #[error("Audio device not available: {0}")]
    DeviceUnavailable(String),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Device buffer queue is full")]
    QueueFull,

    #[error("Render produced non-finite samples")]
    NonFiniteOutput,

    #[error("Render buffer too small: need {needed} samples, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[cfg(feature = "cpal")]
    #[error("Audio device not available")]
    DefaultStreamConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate devices")]
    Devices(#[from] cpal::DevicesError),

    #[cfg(feature = "cpal")]
    #[error("Failed to get device name")]
    DeviceName(#[from] cpal::DeviceNameError),
}

/// Coarse failure classes reported across the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown instrument, sequence, track or note id.
    NotFound,
    /// Input outside its valid range that could not be clamped.
    OutOfRange,
    /// Instrument table is full.
    CapacityExceeded,
    /// Operation issued before the resource it needs exists.
    ResourceUninitialized,
    /// External audio device refused the request.
    Device,
    /// Buffer misuse or a failed render pass.
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InstrumentNotFound(_) => ErrorKind::NotFound,
            Error::InvalidNote(_) | Error::InvalidConfig(_) => ErrorKind::OutOfRange,
            Error::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Error::NotInitialized(_) | Error::DeviceUnavailable(_) => {
                ErrorKind::ResourceUninitialized
            }
            Error::Device(_) | Error::QueueFull => ErrorKind::Device,
            #[cfg(feature = "cpal")]
            Error::DefaultStreamConfig(_)
            | Error::BuildStream(_)
            | Error::PlayStream(_)
            | Error::Devices(_)
            | Error::DeviceName(_) => ErrorKind::Device,
            Error::NonFiniteOutput | Error::BufferTooSmall { .. } => ErrorKind::Internal,
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
