//! Render-side voice state and additive synthesis.

use super::command::VoiceCommand;
use super::oscillator::{
    clamp_unit, midi_to_frequency, phase_increment, NoteSet, OscillatorState, NOTE_COUNT,
};
use super::registry::{Instrument, RegistryInner};
use super::{InstrumentHandle, InstrumentKind};
use crate::config::MAX_BUFFER_FRAMES;
use crate::{EngineConfig, Error, InstrumentId, Result, CHANNELS};
use crossbeam_channel::Receiver;
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct VoiceSlot {
    generation: u32,
    id: Option<InstrumentId>,
    kind: InstrumentKind,
    volume: f32,
    active: NoteSet,
    voices: [OscillatorState; NOTE_COUNT],
}

impl VoiceSlot {
    fn empty() -> Self {
        Self {
            generation: 0,
            id: None,
            kind: InstrumentKind::Sine,
            volume: 0.0,
            active: NoteSet::new(),
            voices: [OscillatorState::default(); NOTE_COUNT],
        }
    }

    fn is_sounding(&self) -> bool {
        self.id.is_some() && !self.active.is_empty()
    }

    /// Match this slot to the registry's record of it.
    ///
    /// Notes held on both sides keep their phase, newly held notes start from
    /// zero and everything else goes quiet.
    fn sync(&mut self, entry: Option<(InstrumentHandle, &Instrument)>) {
        let Some((handle, instrument)) = entry else {
            self.id = None;
            self.active.clear();
            return;
        };
        if self.id.is_none() || self.generation != handle.generation() {
            *self = Self {
                generation: handle.generation(),
                ..Self::empty()
            };
        }
        self.id = Some(instrument.id);
        self.kind = instrument.kind;
        self.volume = instrument.volume;
        for note in 0..NOTE_COUNT as u8 {
            let was_held = self.active.contains(note);
            let voice = &mut self.voices[note as usize];
            if !instrument.active.contains(note) {
                *voice = OscillatorState::default();
            } else if was_held {
                voice.velocity = instrument.velocities[note as usize];
            } else {
                *voice = OscillatorState::trigger(instrument.velocities[note as usize]);
            }
        }
        self.active = instrument.active;
    }
}

/// Owns every oscillator and mixes all instruments into a stereo buffer.
///
/// Fed by the paired [`InstrumentRegistry`](super::InstrumentRegistry).
///
/// # RT Safety
///
/// `render()` drains pending commands with `try_recv` and never allocates.
/// All slot storage is sized up front from `max_instruments`. The registry
/// table is only touched after the command queue overflowed, and then only
/// through `try_lock`; a contended table is retried on the next call.
pub struct InstrumentRenderer {
    commands: Receiver<VoiceCommand>,
    table: Arc<RegistryInner>,
    slots: Vec<VoiceSlot>,
    sample_rate: u32,
    base_amplitude: f32,
    increments: [f32; NOTE_COUNT],
}

impl InstrumentRenderer {
    pub(super) fn new(
        commands: Receiver<VoiceCommand>,
        table: Arc<RegistryInner>,
        config: &EngineConfig,
    ) -> Self {
        let sample_rate = config.sample_rate as f32;
        let mut increments = [0.0; NOTE_COUNT];
        for (note, inc) in increments.iter_mut().enumerate() {
            *inc = phase_increment(midi_to_frequency(note as u8), sample_rate);
        }
        Self {
            commands,
            table,
            slots: (0..config.max_instruments)
                .map(|_| VoiceSlot::empty())
                .collect(),
            sample_rate: config.sample_rate,
            base_amplitude: config.base_amplitude,
            increments,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Apply every queued command. Returns how many were consumed.
    ///
    /// After an overflow the queue is discarded and every slot is rebuilt
    /// from the registry table instead.
    pub fn apply_pending(&mut self) -> usize {
        if self.table.overflowed.load(Ordering::Acquire) {
            if let Some(count) = self.resync() {
                return count;
            }
        }
        let mut count = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
            count += 1;
        }
        count
    }

    fn resync(&mut self) -> Option<usize> {
        let state = self.table.state.try_lock()?;
        let mut discarded = 0;
        while self.commands.try_recv().is_ok() {
            discarded += 1;
        }
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.sync(state.arena.get_index(index));
        }
        self.table.overflowed.store(false, Ordering::Release);
        Some(discarded)
    }

    fn apply(&mut self, command: VoiceCommand) {
        let handle = command.handle();
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return;
        };
        if let VoiceCommand::Load {
            id, kind, volume, ..
        } = command
        {
            *slot = VoiceSlot {
                generation: handle.generation(),
                id: Some(id),
                kind,
                volume,
                ..VoiceSlot::empty()
            };
            return;
        }
        if slot.id.is_none() || slot.generation != handle.generation() {
            return;
        }
        match command {
            VoiceCommand::Unload { .. } => {
                slot.id = None;
                slot.active.clear();
            }
            VoiceCommand::NoteOn { note, velocity, .. } => {
                slot.active.insert(note);
                slot.voices[note as usize] = OscillatorState::trigger(velocity);
            }
            VoiceCommand::NoteOff { note, .. } => {
                slot.active.remove(note);
                slot.voices[note as usize] = OscillatorState::default();
            }
            VoiceCommand::SetVolume { volume, .. } => slot.volume = volume,
            VoiceCommand::Load { .. } => {}
        }
    }

    /// Mix all sounding notes into `buffer` as interleaved stereo.
    ///
    /// `frames` is capped at [`MAX_BUFFER_FRAMES`]. Each instrument's notes are
    /// scaled by `base_amplitude / sqrt(active notes)`, then by instrument
    /// volume, velocity and `master_volume`; the mix is soft-limited with
    /// `tanh`. A buffer shorter than `frames * CHANNELS` is silenced and
    /// rejected.
    pub fn render(&mut self, buffer: &mut [f32], frames: usize, master_volume: f32) -> Result<()> {
        self.apply_pending();

        let frames = frames.min(MAX_BUFFER_FRAMES);
        let needed = frames * CHANNELS;
        if buffer.len() < needed {
            buffer.fill(0.0);
            return Err(Error::BufferTooSmall {
                needed,
                actual: buffer.len(),
            });
        }
        let out = &mut buffer[..needed];
        out.fill(0.0);

        if !self.has_active_notes() {
            return Ok(());
        }

        let master = clamp_unit(master_volume);
        for slot in self.slots.iter_mut().filter(|slot| slot.is_sounding()) {
            let oscillator = slot.kind.strategy().oscillator;
            let base = self.base_amplitude / (slot.active.len() as f32).sqrt() * slot.volume;
            for note in slot.active.iter() {
                let voice = &mut slot.voices[note as usize];
                let amplitude = base * voice.gain() * master;
                let increment = self.increments[note as usize];
                for frame in out.chunks_exact_mut(CHANNELS) {
                    let sample = amplitude * oscillator(voice.phase);
                    frame[0] += sample;
                    frame[1] += sample;
                    voice.advance(increment);
                }
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.tanh();
        }
        if out.iter().any(|sample| !sample.is_finite()) {
            out.fill(0.0);
            return Err(Error::NonFiniteOutput);
        }
        Ok(())
    }

    /// True if any loaded instrument has a note held, as of the last applied command.
    pub fn has_active_notes(&self) -> bool {
        self.slots.iter().any(VoiceSlot::is_sounding)
    }

    /// Oscillator phase of a held note, as of the last applied command.
    pub fn phase(&self, id: InstrumentId, note: u8) -> Option<f32> {
        let slot = self.slots.iter().find(|slot| slot.id == Some(id))?;
        slot.active
            .contains(note)
            .then(|| slot.voices[note as usize & 0x7f].phase)
    }
}
