//! MultitrackEngine that owns the instrument, render and sequencing subsystems

use crate::core::{
    EngineConfig, EngineState, InstrumentId, InstrumentInfo, InstrumentKind, InstrumentRegistry,
    RenderCallback, RenderEngine, RenderHandle, RenderStatsSnapshot, DEFAULT_INSTRUMENT_ID,
};
use crate::sequencer::{NoteId, Sequence, SequenceId, Sequencer, TrackId};
use crate::Result;
use tracing::{info, warn};

const TEST_TONE_NOTE: i32 = 60;
const TEST_TONE_VELOCITY: i32 = 100;

/// Main audio engine.
///
/// Owns the [`InstrumentRegistry`], the render engine and the [`Sequencer`]
/// for its whole lifetime. Every method is safe to call from any control
/// thread; the audio device reaches the render engine only through
/// [`render_callback`](Self::render_callback).
///
/// # Example
///
/// ```ignore
/// use multitrack::prelude::*;
///
/// let engine = MultitrackEngine::init(44100)?;
/// engine.start()?;
///
/// let lead = engine.create_instrument("lead")?;
/// engine.note_on(lead, 60, 100)?;
///
/// let seq = engine.create_sequence(120);
/// let track = engine.add_track(seq, lead)?;
/// engine.add_note(seq, track, 64, 90, 0.0, 1.0)?;
/// engine.start_playback(seq)?;
/// ```
pub struct MultitrackEngine {
    config: EngineConfig,
    instruments: InstrumentRegistry,
    sequencer: Sequencer,
    render: RenderHandle,
}

impl MultitrackEngine {
    pub fn builder() -> crate::MultitrackEngineBuilder {
        crate::MultitrackEngineBuilder::default()
    }

    /// Build an engine with default settings at `sample_rate`.
    pub fn init(sample_rate: u32) -> Result<Self> {
        Self::builder().sample_rate(sample_rate).build()
    }

    pub(crate) fn from_parts(
        config: EngineConfig,
        instruments: InstrumentRegistry,
        sequencer: Sequencer,
        render: RenderHandle,
    ) -> Self {
        Self {
            config,
            instruments,
            sequencer,
            render,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn start(&self) -> Result<()> {
        Ok(self.render.start()?)
    }

    pub fn stop(&self) -> Result<()> {
        Ok(self.render.stop()?)
    }

    pub fn state(&self) -> EngineState {
        self.render.state()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Entry point for a platform audio layer to request buffers.
    pub fn render_callback(&self) -> RenderCallback {
        self.render.callback()
    }

    pub fn render_stats(&self) -> RenderStatsSnapshot {
        self.render.stats()
    }

    /// Run `f` with the render engine locked.
    pub fn with_render_engine<R>(&self, f: impl FnOnce(&mut RenderEngine) -> R) -> R {
        self.render.with_engine(f)
    }

    /// Stop playback and the render engine, then release everything.
    pub fn shutdown(self) {
        drop(self);
    }

    // =========================================================================
    // Master volume
    // =========================================================================

    /// Clamped to [0, 1]. Returns the applied value.
    pub fn set_master_volume(&self, volume: f32) -> f32 {
        self.render.set_master_volume(volume)
    }

    pub fn master_volume(&self) -> f32 {
        self.render.master_volume()
    }

    // =========================================================================
    // Instruments
    // =========================================================================

    /// Create a sine instrument.
    pub fn create_instrument(&self, name: &str) -> Result<InstrumentId> {
        Ok(self
            .instruments
            .create_instrument(InstrumentKind::Sine, name)?)
    }

    pub fn unload_instrument(&self, id: InstrumentId) -> Result<()> {
        Ok(self.instruments.unload_instrument(id)?)
    }

    /// Clamped to [0, 1]. Returns the applied value.
    pub fn set_instrument_volume(&self, id: InstrumentId, volume: f32) -> Result<f32> {
        Ok(self.instruments.set_volume(id, volume)?)
    }

    pub fn note_on(&self, id: InstrumentId, note: i32, velocity: i32) -> Result<()> {
        self.instruments.note_on(id, note, velocity)?;
        Ok(())
    }

    /// Succeeds for any loaded instrument, even if the note was not sounding.
    pub fn note_off(&self, id: InstrumentId, note: i32) -> Result<()> {
        self.instruments.note_off(id, note)?;
        Ok(())
    }

    pub fn instrument_ids(&self) -> Vec<InstrumentId> {
        self.instruments.instrument_ids()
    }

    pub fn instrument(&self, id: InstrumentId) -> Option<InstrumentInfo> {
        self.instruments.instrument(id)
    }

    pub fn instruments(&self) -> &InstrumentRegistry {
        &self.instruments
    }

    /// Middle C on the default instrument.
    pub fn play_test_tone(&self) -> Result<()> {
        info!("playing test tone");
        self.note_on(DEFAULT_INSTRUMENT_ID, TEST_TONE_NOTE, TEST_TONE_VELOCITY)
    }

    /// Release notes around middle C on every instrument.
    ///
    /// Succeeds if at least one instrument accepted the release.
    pub fn stop_test_tone(&self) -> Result<()> {
        let mut ids = self.instrument_ids();
        if ids.is_empty() {
            warn!("no instruments loaded, trying default instrument");
            ids.push(DEFAULT_INSTRUMENT_ID);
        }

        let mut last_err = None;
        let mut accepted = false;
        for id in ids {
            for note in TEST_TONE_NOTE - 2..=TEST_TONE_NOTE + 2 {
                match self.instruments.note_off(id, note) {
                    Ok(_) => accepted = true,
                    Err(e) => last_err = Some(e),
                }
            }
        }
        match (accepted, last_err) {
            (false, Some(e)) => Err(e.into()),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Sequencing
    // =========================================================================

    /// Non-positive tempos become 120 bpm.
    pub fn create_sequence(&self, tempo: i32) -> SequenceId {
        self.sequencer.create_sequence(tempo)
    }

    pub fn add_track(&self, sequence: SequenceId, instrument: InstrumentId) -> Result<TrackId> {
        Ok(self.sequencer.add_track(sequence, instrument)?)
    }

    pub fn add_note(
        &self,
        sequence: SequenceId,
        track: TrackId,
        note: i32,
        velocity: i32,
        start_time: f64,
        duration: f64,
    ) -> Result<NoteId> {
        Ok(self
            .sequencer
            .add_note(sequence, track, note, velocity, start_time, duration)?)
    }

    pub fn delete_note(&self, sequence: SequenceId, track: TrackId, note: NoteId) -> Result<()> {
        Ok(self.sequencer.delete_note(sequence, track, note)?)
    }

    pub fn delete_track(&self, sequence: SequenceId, track: TrackId) -> Result<()> {
        Ok(self.sequencer.delete_track(sequence, track)?)
    }

    pub fn delete_sequence(&self, sequence: SequenceId) -> Result<()> {
        Ok(self.sequencer.delete_sequence(sequence)?)
    }

    pub fn set_track_volume(&self, sequence: SequenceId, track: TrackId, volume: f32) -> Result<f32> {
        Ok(self.sequencer.set_track_volume(sequence, track, volume)?)
    }

    pub fn start_playback(&self, sequence: SequenceId) -> Result<()> {
        Ok(self.sequencer.start_playback(sequence)?)
    }

    pub fn stop_playback(&self) {
        self.sequencer.stop_playback();
    }

    pub fn sequence(&self, id: SequenceId) -> Option<Sequence> {
        self.sequencer.sequence(id)
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }
}

impl Drop for MultitrackEngine {
    fn drop(&mut self) {
        self.sequencer.stop_playback();
        if let Err(e) = self.render.stop() {
            warn!("failed to stop render engine: {e}");
        }
        info!("multitrack engine shut down");
    }
}
