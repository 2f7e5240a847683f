//! Instruments: the control-side registry and the render-side synthesizer.
//!
//! [`InstrumentRegistry::new`] returns a connected pair. Control threads call
//! the registry; the audio callback owns the [`InstrumentRenderer`].

mod arena;
mod command;
mod kind;
mod oscillator;
mod registry;
mod renderer;

pub use arena::InstrumentHandle;
pub use kind::{InstrumentKind, SynthesisStrategy};
pub use oscillator::{
    clamp_unit, clamp_velocity, midi_to_frequency, validate_note, NoteSet, OscillatorState,
    MAX_VELOCITY, MIN_VELOCITY, NOTE_COUNT,
};
pub use registry::{
    InstrumentInfo, InstrumentRegistry, DEFAULT_INSTRUMENT_ID, DEFAULT_INSTRUMENT_NAME,
    DEFAULT_INSTRUMENT_VOLUME,
};
pub use renderer::InstrumentRenderer;
