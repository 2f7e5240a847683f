//! Sequences of tracks and notes, played through an [`InstrumentRegistry`].
//!
//! # Example
//!
//! ```ignore
//! use multitrack_sequencer::Sequencer;
//!
//! let sequencer = Sequencer::new(registry.clone());
//! let seq = sequencer.create_sequence(120);
//! let track = sequencer.add_track(seq, lead)?;
//! sequencer.add_note(seq, track, 60, 100, 0.0, 1.0)?;
//! sequencer.start_playback(seq)?;
//! ```
//!
//! [`InstrumentRegistry`]: multitrack_core::InstrumentRegistry

pub mod error;
pub use error::{Error, Result};

mod model;
pub use model::{Note, Sequence, Track, DEFAULT_NOTE_DURATION, DEFAULT_TEMPO};

mod transport;
pub use transport::{TransitionResult, Transport, TransportEvent, TransportState};

mod sequencer;
pub use sequencer::Sequencer;

pub type SequenceId = u32;
pub type TrackId = u32;
pub type NoteId = u32;
