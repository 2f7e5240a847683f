//! Builder for configuring and constructing a `MultitrackEngine`.

use crate::core::{
    AudioDevice, EngineConfig, InstrumentRegistry, MemoryDevice, RenderEngine, RenderHandle,
};
use crate::sequencer::Sequencer;
use crate::{MultitrackEngine, Result};
use tracing::info;

enum OutputChoice {
    None,
    Memory,
    Device(Box<dyn AudioDevice>),
    #[cfg(feature = "cpal")]
    Cpal(Option<usize>),
}

/// With the `cpal` feature the engine plays through the default system
/// output unless told otherwise; without it no device is attached and
/// `start()` fails until one is supplied.
///
/// # Example
///
/// ```ignore
/// use multitrack::prelude::*;
///
/// let output = MemoryDevice::new(2);
/// let engine = MultitrackEngine::builder()
///     .sample_rate(48000)
///     .frames_per_buffer(256)
///     .device(output.clone())
///     .build()?;
///
/// engine.start()?;
/// ```
pub struct MultitrackEngineBuilder {
    config: EngineConfig,
    output: OutputChoice,
}

impl Default for MultitrackEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            #[cfg(feature = "cpal")]
            output: OutputChoice::Cpal(None),
            #[cfg(not(feature = "cpal"))]
            output: OutputChoice::None,
        }
    }
}

impl MultitrackEngineBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 512
    pub fn frames_per_buffer(mut self, frames: usize) -> Self {
        self.config.frames_per_buffer = frames;
        self
    }

    /// Default: 2
    pub fn buffer_count(mut self, count: usize) -> Self {
        self.config.buffer_count = count;
        self
    }

    /// Default: 32
    pub fn max_instruments(mut self, max: usize) -> Self {
        self.config.max_instruments = max;
        self
    }

    /// Default: 0.15
    pub fn base_amplitude(mut self, amplitude: f32) -> Self {
        self.config.base_amplitude = amplitude;
        self
    }

    /// Create instrument 0 at build time. Default: true
    pub fn default_instrument(mut self, enabled: bool) -> Self {
        self.config.default_instrument = enabled;
        self
    }

    /// Route note-ons for unknown instruments to instrument 0. Default: true
    pub fn unknown_instrument_fallback(mut self, enabled: bool) -> Self {
        self.config.unknown_instrument_fallback = enabled;
        self
    }

    /// Play through `device`.
    pub fn device(mut self, device: impl AudioDevice + 'static) -> Self {
        self.output = OutputChoice::Device(Box::new(device));
        self
    }

    /// Play into an internal [`MemoryDevice`] nobody drains.
    pub fn memory_output(mut self) -> Self {
        self.output = OutputChoice::Memory;
        self
    }

    /// Build without an output device.
    pub fn no_output(mut self) -> Self {
        self.output = OutputChoice::None;
        self
    }

    /// Use the system output device at `index`, or the default when `None`.
    #[cfg(feature = "cpal")]
    pub fn output_device(mut self, index: Option<usize>) -> Self {
        self.output = OutputChoice::Cpal(index);
        self
    }

    /// Validate the configuration, wire up the subsystems and initialize the
    /// render engine. The returned engine is initialized but not running.
    pub fn build(self) -> Result<MultitrackEngine> {
        let config = self.config;
        config.validate()?;

        let device: Option<Box<dyn AudioDevice>> = match self.output {
            OutputChoice::None => None,
            OutputChoice::Memory => Some(Box::new(MemoryDevice::new(config.buffer_count))),
            OutputChoice::Device(device) => Some(device),
            #[cfg(feature = "cpal")]
            OutputChoice::Cpal(index) => {
                Some(Box::new(crate::core::CpalDevice::new(index, &config)?))
            }
        };

        let (instruments, renderer) = InstrumentRegistry::new(&config);
        let render = RenderHandle::new(RenderEngine::new(renderer, &config, device));
        render.init()?;

        if config.default_instrument {
            instruments.create_default_instrument()?;
        }
        let sequencer = Sequencer::new(instruments.clone());

        info!(sample_rate = config.sample_rate, "multitrack engine initialized");
        Ok(MultitrackEngine::from_parts(
            config,
            instruments,
            sequencer,
            render,
        ))
    }
}
