//! Real-time instrument synthesis and double-buffered PCM output.
//!
//! # Primary API
//!
//! - [`InstrumentRegistry`]: create instruments and play notes (control threads)
//! - [`InstrumentRenderer`]: additive synthesis, owned by the render path
//! - [`RenderHandle`] / [`RenderEngine`]: lifecycle and buffer rotation
//! - [`AudioDevice`]: where rendered buffers go ([`MemoryDevice`] in-process)
//!
//! # Feature-gated APIs
//!
//! - `"cpal"`: [`CpalDevice`] for system audio output
//!
//! # Example
//!
//! ```ignore
//! use multitrack_core::*;
//!
//! let config = EngineConfig::default();
//! let (registry, renderer) = InstrumentRegistry::new(&config);
//! let device = MemoryDevice::new(config.buffer_count);
//! let render = RenderHandle::new(RenderEngine::new(renderer, &config, Some(Box::new(device))));
//!
//! render.init()?;
//! render.start()?;
//! let id = registry.create_instrument(InstrumentKind::Sine, "lead")?;
//! registry.note_on(id, 60, 100)?;
//! ```

pub mod error;
pub use error::{Error, ErrorKind, Result};

pub mod config;
pub use config::{
    EngineConfig, COMMAND_QUEUE_CAPACITY, DEFAULT_MAX_INSTRUMENTS, MAX_BUFFER_FRAMES,
    MAX_INSTRUMENTS_LIMIT,
};

mod lockfree;
pub use lockfree::{AtomicFloat, RenderStats, RenderStatsSnapshot};

pub mod instrument;
pub use instrument::{
    midi_to_frequency, InstrumentHandle, InstrumentInfo, InstrumentKind, InstrumentRegistry,
    InstrumentRenderer, DEFAULT_INSTRUMENT_ID,
};

pub mod render;
pub use render::{EngineState, RenderCallback, RenderEngine, RenderHandle};

pub mod device;
pub use device::{AudioDevice, MemoryDevice, StreamFormat};

#[cfg(feature = "cpal")]
pub use device::CpalDevice;

/// Public instrument identifier. Never reused within a registry.
pub type InstrumentId = u32;

/// Output is always interleaved stereo.
pub const CHANNELS: usize = 2;
