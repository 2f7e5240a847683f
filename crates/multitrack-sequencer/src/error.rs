//! Error types for multitrack-sequencer.

use crate::{NoteId, SequenceId, TrackId};
use multitrack_core::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Sequence {0} not found")]
    SequenceNotFound(SequenceId),

    #[error("Track {track} not found in sequence {sequence}")]
    TrackNotFound { sequence: SequenceId, track: TrackId },

    #[error("Note {note} not found in track {track}")]
    NoteNotFound { track: TrackId, note: NoteId },

    #[error(transparent)]
    Instrument(#[from] multitrack_core::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SequenceNotFound(_) | Error::TrackNotFound { .. } | Error::NoteNotFound { .. } => {
                ErrorKind::NotFound
            }
            Error::Instrument(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
