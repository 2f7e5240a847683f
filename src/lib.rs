//! # Multitrack - Real-time Multitrack Audio Core
//!
//! Polyphonic sine instruments, a double-buffered 16-bit render engine and a
//! note sequencer behind one engine handle.
//!
//! ## Architecture
//!
//! Multitrack is an umbrella crate that coordinates:
//! - **multitrack-core** - Instruments, renderer, render engine lifecycle, audio devices
//! - **multitrack-sequencer** - Sequences, tracks, notes and the playback transport
//!
//! ## Quick Start
//!
//! ```ignore
//! use multitrack::prelude::*;
//!
//! let engine = MultitrackEngine::builder()
//!     .sample_rate(44100)
//!     .build()?;
//! engine.start()?;
//!
//! let lead = engine.create_instrument("lead")?;
//! engine.note_on(lead, 60, 100)?;
//! engine.note_off(lead, 60)?;
//! ```
//!
//! Hosts that only understand status codes go through [`EngineBridge`].
//!
//! ## Feature Flags
//!
//! - `default` - Core engine with in-memory output
//! - `cpal` - System audio output through CPAL

/// Re-export of multitrack-core for direct access
pub use multitrack_core as core;

/// Re-export of multitrack-sequencer for direct access
pub use multitrack_sequencer as sequencer;

pub use multitrack_core::{
    midi_to_frequency, AudioDevice, EngineConfig, EngineState, ErrorKind, InstrumentId,
    InstrumentInfo, InstrumentKind, MemoryDevice, RenderCallback, RenderStatsSnapshot,
    StreamFormat, DEFAULT_INSTRUMENT_ID,
};

#[cfg(feature = "cpal")]
pub use multitrack_core::CpalDevice;

pub use multitrack_sequencer::{Note, NoteId, Sequence, SequenceId, Track, TrackId};

mod bridge;
mod builder;
mod engine;
mod error;

pub use bridge::EngineBridge;
pub use builder::MultitrackEngineBuilder;
pub use engine::MultitrackEngine;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        EngineBridge, EngineConfig, EngineState, MultitrackEngine, MultitrackEngineBuilder,
    };

    pub use crate::core::{AudioDevice, InstrumentId, MemoryDevice};
    pub use crate::sequencer::{NoteId, SequenceId, TrackId};

    #[cfg(feature = "cpal")]
    pub use crate::core::CpalDevice;
}
