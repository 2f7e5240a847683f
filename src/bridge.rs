//! Status-code surface for hosts that cannot carry Rust errors.
//!
//! Every call returns `bool` or an `i32` id (`-1` on failure). Errors and
//! panics are caught, logged and turned into the failure value.

use crate::core::{ErrorKind, InstrumentId};
use crate::{Error, MultitrackEngine, MultitrackEngineBuilder, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, info, warn};

const FAILURE: i32 = -1;

/// Owns at most one [`MultitrackEngine`], created by [`init`](Self::init).
#[derive(Default)]
pub struct EngineBridge {
    engine: Option<MultitrackEngine>,
}

impl EngineBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&MultitrackEngine> {
        self.engine.as_ref()
    }

    /// Create the engine with the builder's default output.
    ///
    /// With the `cpal` feature that is the system output device. Without it
    /// no device is attached: `init` succeeds but every `start` fails until
    /// the host calls [`init_with`](Self::init_with) and a builder carrying
    /// [`device`](MultitrackEngineBuilder::device) instead.
    ///
    /// A second call keeps the existing engine and succeeds.
    pub fn init(&mut self, sample_rate: i32) -> bool {
        let Ok(sample_rate) = u32::try_from(sample_rate) else {
            error!(sample_rate, "init: invalid sample rate");
            return false;
        };
        #[cfg(not(feature = "cpal"))]
        if self.engine.is_none() {
            warn!("init: built without the cpal feature, no output device attached");
        }
        self.init_with(MultitrackEngine::builder().sample_rate(sample_rate))
    }

    /// Like [`init`](Self::init) with a caller-configured builder.
    pub fn init_with(&mut self, builder: MultitrackEngineBuilder) -> bool {
        if self.engine.is_some() {
            info!("init: engine already initialized");
            return true;
        }
        match guard("init", || builder.build()) {
            Some(engine) => {
                self.engine = Some(engine);
                true
            }
            None => false,
        }
    }

    pub fn start(&self) -> bool {
        self.status("start", |e| e.start())
    }

    pub fn stop(&self) -> bool {
        self.status("stop", |e| e.stop())
    }

    pub fn set_master_volume(&self, volume: f32) {
        self.call("set_master_volume", |e| Ok(e.set_master_volume(volume)));
    }

    pub fn create_instrument(&self, name: &str) -> i32 {
        self.id("create_instrument", |e| e.create_instrument(name))
    }

    pub fn unload_instrument(&self, id: i32) -> bool {
        self.status("unload_instrument", |e| e.unload_instrument(instrument_id(id)?))
    }

    pub fn note_on(&self, id: i32, note: i32, velocity: i32) -> bool {
        self.status("note_on", |e| e.note_on(instrument_id(id)?, note, velocity))
    }

    pub fn note_off(&self, id: i32, note: i32) -> bool {
        self.status("note_off", |e| e.note_off(instrument_id(id)?, note))
    }

    pub fn set_instrument_volume(&self, id: i32, volume: f32) -> bool {
        self.status("set_instrument_volume", |e| {
            e.set_instrument_volume(instrument_id(id)?, volume).map(drop)
        })
    }

    pub fn create_sequence(&self, tempo: i32) -> i32 {
        self.id("create_sequence", |e| Ok(e.create_sequence(tempo)))
    }

    pub fn add_track(&self, sequence: i32, instrument: i32) -> i32 {
        self.id("add_track", |e| {
            e.add_track(unsigned(sequence)?, instrument_id(instrument)?)
        })
    }

    pub fn add_note(
        &self,
        sequence: i32,
        track: i32,
        note: i32,
        velocity: i32,
        start_time: f64,
        duration: f64,
    ) -> i32 {
        self.id("add_note", |e| {
            e.add_note(
                unsigned(sequence)?,
                unsigned(track)?,
                note,
                velocity,
                start_time,
                duration,
            )
        })
    }

    pub fn start_playback(&self, sequence: i32) -> bool {
        self.status("start_playback", |e| e.start_playback(unsigned(sequence)?))
    }

    pub fn stop_playback(&self) -> bool {
        self.status("stop_playback", |e| {
            e.stop_playback();
            Ok(())
        })
    }

    pub fn delete_sequence(&self, sequence: i32) -> bool {
        self.status("delete_sequence", |e| e.delete_sequence(unsigned(sequence)?))
    }

    pub fn delete_track(&self, sequence: i32, track: i32) -> bool {
        self.status("delete_track", |e| {
            e.delete_track(unsigned(sequence)?, unsigned(track)?)
        })
    }

    pub fn delete_note(&self, sequence: i32, track: i32, note: i32) -> bool {
        self.status("delete_note", |e| {
            e.delete_note(unsigned(sequence)?, unsigned(track)?, unsigned(note)?)
        })
    }

    pub fn set_track_volume(&self, sequence: i32, track: i32, volume: f32) -> bool {
        self.status("set_track_volume", |e| {
            e.set_track_volume(unsigned(sequence)?, unsigned(track)?, volume)
                .map(drop)
        })
    }

    pub fn play_test_tone(&self) -> bool {
        self.status("play_test_tone", |e| e.play_test_tone())
    }

    pub fn stop_test_tone(&self) -> bool {
        self.status("stop_test_tone", |e| e.stop_test_tone())
    }

    /// Shut the engine down. The bridge can be initialized again afterwards.
    pub fn dispose(&mut self) {
        if let Some(engine) = self.engine.take() {
            guard("dispose", || {
                engine.shutdown();
                Ok(())
            });
        }
    }

    fn call<T>(&self, op: &str, f: impl FnOnce(&MultitrackEngine) -> Result<T>) -> Option<T> {
        let Some(engine) = self.engine.as_ref() else {
            error!("{op}: {}", Error::NotInitialized);
            return None;
        };
        guard(op, || f(engine))
    }

    fn status(&self, op: &str, f: impl FnOnce(&MultitrackEngine) -> Result<()>) -> bool {
        self.call(op, f).is_some()
    }

    fn id(&self, op: &str, f: impl FnOnce(&MultitrackEngine) -> Result<u32>) -> i32 {
        self.call(op, f)
            .and_then(|id| i32::try_from(id).ok())
            .unwrap_or(FAILURE)
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn guard<T>(op: &str, f: impl FnOnce() -> Result<T>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            match e.kind() {
                ErrorKind::NotFound | ErrorKind::OutOfRange => warn!("{op}: {e}"),
                _ => error!("{op}: {e}"),
            }
            None
        }
        Err(_) => {
            error!("{op}: panicked");
            None
        }
    }
}

fn unsigned(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidId(value))
}

fn instrument_id(value: i32) -> Result<InstrumentId> {
    unsigned(value)
}
