//! Double-buffered render engine and the handles that drive it.

use super::convert::encode_i16;
use super::fsm::{EngineEvent, EngineState, TransitionResult};
use crate::device::{AudioDevice, StreamFormat};
use crate::instrument::InstrumentRenderer;
use crate::{AtomicFloat, EngineConfig, Error, RenderStats, RenderStatsSnapshot, Result};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// Renders instrument audio into a ring of 16-bit buffers and feeds the device.
pub struct RenderEngine {
    state: EngineState,
    format: StreamFormat,
    buffer_count: usize,
    buffers: Vec<Vec<i16>>,
    current: usize,
    scratch: Vec<f32>,
    renderer: InstrumentRenderer,
    device: Option<Box<dyn AudioDevice>>,
    master_volume: Arc<AtomicFloat>,
    stats: Arc<RenderStats>,
}

impl RenderEngine {
    pub fn new(
        renderer: InstrumentRenderer,
        config: &EngineConfig,
        device: Option<Box<dyn AudioDevice>>,
    ) -> Self {
        Self {
            state: EngineState::Uninitialized,
            format: StreamFormat::from_config(config),
            buffer_count: config.buffer_count,
            buffers: Vec::new(),
            current: 0,
            scratch: Vec::new(),
            renderer,
            device,
            master_volume: Arc::new(AtomicFloat::new(1.0)),
            stats: Arc::new(RenderStats::default()),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn device_name(&self) -> Option<String> {
        self.device.as_ref().map(|device| device.name())
    }

    /// Allocate the output buffers. Idempotent.
    pub fn init(&mut self) -> Result<()> {
        match self.state.transition(EngineEvent::Init) {
            TransitionResult::StateChanged(next) => {
                let samples = self.format.samples_per_buffer();
                self.buffers = vec![vec![0; samples]; self.buffer_count];
                self.scratch = vec![0.0; samples];
                self.current = 0;
                self.state = next;
                info!(
                    sample_rate = self.format.sample_rate,
                    frames = self.format.frames_per_buffer,
                    buffers = self.buffer_count,
                    "render engine initialized"
                );
            }
            _ => debug!("render engine already initialized"),
        }
        Ok(())
    }

    /// Prime the device with one silent buffer and start playback.
    ///
    /// `callback` is handed to the device, which invokes it once per consumed buffer.
    pub fn start(&mut self, callback: RenderCallback) -> Result<()> {
        let next = match self.state.transition(EngineEvent::Start) {
            TransitionResult::StateChanged(next) => next,
            TransitionResult::None => {
                debug!("render engine already running");
                return Ok(());
            }
            TransitionResult::Rejected => {
                error!("cannot start: render engine not initialized");
                return Err(Error::NotInitialized("render engine"));
            }
        };

        let Some(device) = self.device.as_mut() else {
            error!("cannot start: no audio device attached");
            return Err(Error::DeviceUnavailable("no output device attached".into()));
        };

        for buffer in &mut self.buffers {
            buffer.fill(0);
        }
        self.current = 0;

        device.enqueue(&self.buffers[0]).inspect_err(|e| {
            error!("failed to prime audio device: {e}");
        })?;
        if let Err(e) = device.play(self.format, callback) {
            error!("failed to start audio device: {e}");
            let _ = device.clear();
            return Err(e);
        }

        self.state = next;
        info!(device = %device.name(), "render engine started");
        Ok(())
    }

    /// Stop playback and flush queued buffers. Stopping when not running is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        match self.state.transition(EngineEvent::Stop) {
            TransitionResult::StateChanged(next) => {
                if let Some(device) = self.device.as_mut() {
                    if let Err(e) = device.clear() {
                        warn!("failed to clear audio device: {e}");
                    }
                }
                self.state = next;
                info!("render engine stopped");
                Ok(())
            }
            TransitionResult::None => Ok(()),
            TransitionResult::Rejected => {
                warn!("cannot stop: render engine not initialized");
                Err(Error::NotInitialized("render engine"))
            }
        }
    }

    /// Render and queue the next buffer.
    ///
    /// Returns false when not running or when the device refused the buffer.
    ///
    /// # RT Safety
    ///
    /// No allocation, blocking or logging. A failed or panicking render pass is
    /// replaced by silence and counted in [`RenderStats`].
    pub fn process_buffer(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.stats.record_callback();

        self.current = (self.current + 1) % self.buffers.len();
        self.scratch.fill(0.0);

        let frames = self.format.frames_per_buffer;
        let master = self.master_volume.get();
        let rendered = catch_unwind(AssertUnwindSafe(|| {
            self.renderer.render(&mut self.scratch, frames, master)
        }));
        if !matches!(rendered, Ok(Ok(()))) {
            self.scratch.fill(0.0);
            self.stats.record_fault();
        }

        let buffer = &mut self.buffers[self.current];
        encode_i16(&self.scratch, buffer);

        let queued = match self.device.as_mut() {
            Some(device) => device.enqueue(buffer).is_ok(),
            None => false,
        };
        if !queued {
            self.stats.record_dropped();
        }
        queued
    }

    /// The buffer most recently rendered.
    pub fn current_buffer(&self) -> &[i16] {
        self.buffers
            .get(self.current)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn renderer(&self) -> &InstrumentRenderer {
        &self.renderer
    }

    pub fn master_volume(&self) -> &Arc<AtomicFloat> {
        &self.master_volume
    }

    pub fn stats(&self) -> &Arc<RenderStats> {
        &self.stats
    }
}

/// Shared handle to a [`RenderEngine`].
///
/// Control threads drive the lifecycle through it; the device reaches the
/// engine through the [`RenderCallback`] it hands out.
#[derive(Clone)]
pub struct RenderHandle {
    engine: Arc<Mutex<RenderEngine>>,
    master_volume: Arc<AtomicFloat>,
    stats: Arc<RenderStats>,
}

impl RenderHandle {
    pub fn new(engine: RenderEngine) -> Self {
        let master_volume = Arc::clone(engine.master_volume());
        let stats = Arc::clone(engine.stats());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            master_volume,
            stats,
        }
    }

    pub fn init(&self) -> Result<()> {
        self.engine.lock().init()
    }

    pub fn start(&self) -> Result<()> {
        let callback = self.callback();
        self.engine.lock().start(callback)
    }

    pub fn stop(&self) -> Result<()> {
        self.engine.lock().stop()
    }

    pub fn state(&self) -> EngineState {
        self.engine.lock().state()
    }

    /// Callback for the device to invoke once per consumed buffer.
    pub fn callback(&self) -> RenderCallback {
        RenderCallback {
            engine: Arc::downgrade(&self.engine),
        }
    }

    /// Set master gain, clamped to [0, 1]. Returns the applied value.
    pub fn set_master_volume(&self, volume: f32) -> f32 {
        let applied = crate::instrument::clamp_unit(volume);
        if applied != volume {
            warn!(volume, applied, "master volume clamped");
        }
        self.master_volume.set(applied);
        applied
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume.get()
    }

    pub fn stats(&self) -> RenderStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run `f` with the engine locked.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut RenderEngine) -> R) -> R {
        f(&mut self.engine.lock())
    }
}

/// Weak entry point the audio device calls to render one buffer.
#[derive(Clone)]
pub struct RenderCallback {
    engine: Weak<Mutex<RenderEngine>>,
}

impl RenderCallback {
    /// Render and queue one buffer.
    ///
    /// Returns false if the engine is gone, not running, busy with a control
    /// operation, or the device refused the buffer. Never blocks.
    pub fn tick(&self) -> bool {
        let Some(engine) = self.engine.upgrade() else {
            return false;
        };
        let Some(mut engine) = engine.try_lock() else {
            return false;
        };
        engine.process_buffer()
    }
}
