//! Audio engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest buffer a single render call will fill.
pub const MAX_BUFFER_FRAMES: usize = 4096;

/// Instrument cap for constrained (mobile) hosts.
pub const DEFAULT_MAX_INSTRUMENTS: usize = 32;

/// Hard ceiling for `max_instruments`.
pub const MAX_INSTRUMENTS_LIMIT: usize = 128;

/// Commands the registry may queue ahead of the renderer. Past this the
/// renderer rebuilds its voices from the registry table instead.
pub const COMMAND_QUEUE_CAPACITY: usize = 512;

/// Configuration for the audio engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub frames_per_buffer: usize,
    /// Number of output buffers rotated between render passes.
    pub buffer_count: usize,
    pub max_instruments: usize,
    /// Per-instrument amplitude before the `1/sqrt(active notes)` scaling.
    pub base_amplitude: f32,
    /// Create the reserved instrument 0 at startup.
    pub default_instrument: bool,
    /// Route note-ons for unknown instruments to instrument 0 when it exists.
    pub unknown_instrument_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frames_per_buffer: 512,
            buffer_count: 2,
            max_instruments: DEFAULT_MAX_INSTRUMENTS,
            base_amplitude: 0.15,
            default_instrument: true,
            unknown_instrument_fallback: true,
        }
    }
}

impl EngineConfig {
    /// Preset for phones and tablets.
    pub fn mobile() -> Self {
        Self::default()
    }

    /// Preset for desktop hosts with more headroom.
    pub fn desktop() -> Self {
        Self {
            max_instruments: MAX_INSTRUMENTS_LIMIT,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(8000..=384000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.frames_per_buffer == 0 || self.frames_per_buffer > MAX_BUFFER_FRAMES {
            return Err(Error::InvalidConfig(format!(
                "frames_per_buffer {} out of range (1-{MAX_BUFFER_FRAMES})",
                self.frames_per_buffer
            )));
        }
        if self.buffer_count < 2 {
            return Err(Error::InvalidConfig(format!(
                "buffer_count {} must be at least 2",
                self.buffer_count
            )));
        }
        if self.max_instruments == 0 || self.max_instruments > MAX_INSTRUMENTS_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "max_instruments {} out of range (1-{MAX_INSTRUMENTS_LIMIT})",
                self.max_instruments
            )));
        }
        if !(self.base_amplitude > 0.0 && self.base_amplitude <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "base_amplitude {} out of range (0-1]",
                self.base_amplitude
            )));
        }
        Ok(())
    }

    /// Interleaved stereo samples per output buffer.
    pub fn samples_per_buffer(&self) -> usize {
        self.frames_per_buffer * crate::CHANNELS
    }
}
