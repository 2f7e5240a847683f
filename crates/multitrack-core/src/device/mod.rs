//! Audio output devices.
//!
//! A device consumes 16-bit interleaved stereo buffers and calls back into
//! the engine through a [`RenderCallback`] whenever it wants more.

mod memory;
pub use memory::MemoryDevice;

#[cfg(feature = "cpal")]
mod cpal_output;
#[cfg(feature = "cpal")]
pub use cpal_output::CpalDevice;

use crate::render::RenderCallback;
use crate::{EngineConfig, Result, CHANNELS};

/// Shape of the buffers the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames_per_buffer: usize,
}

impl StreamFormat {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: CHANNELS as u16,
            frames_per_buffer: config.frames_per_buffer,
        }
    }

    pub fn samples_per_buffer(&self) -> usize {
        self.frames_per_buffer * self.channels as usize
    }
}

/// A sink for rendered buffers.
pub trait AudioDevice: Send {
    fn name(&self) -> String;

    /// Begin playback. The device invokes `callback` each time it has
    /// consumed a buffer and wants the next one.
    fn play(&mut self, format: StreamFormat, callback: RenderCallback) -> Result<()>;

    /// Queue one interleaved buffer. Must not block.
    fn enqueue(&mut self, samples: &[i16]) -> Result<()>;

    /// Stop playback and drop any queued buffers.
    fn clear(&mut self) -> Result<()>;
}
