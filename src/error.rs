//! Centralized error type for the multitrack umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use multitrack_core::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] multitrack_core::Error),

    #[error("Sequencer: {0}")]
    Sequencer(#[from] multitrack_sequencer::Error),

    #[error("Engine is not initialized")]
    NotInitialized,

    #[error("Invalid id: {0}")]
    InvalidId(i32),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Core(e) => e.kind(),
            Error::Sequencer(e) => e.kind(),
            Error::NotInitialized => ErrorKind::ResourceUninitialized,
            Error::InvalidId(_) => ErrorKind::NotFound,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
