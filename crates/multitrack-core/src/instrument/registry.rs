//! Control-side instrument table.

use super::arena::Arena;
use super::command::VoiceCommand;
use super::oscillator::{clamp_unit, clamp_velocity, validate_note, NoteSet, NOTE_COUNT};
use super::{InstrumentHandle, InstrumentKind, InstrumentRenderer};
use crate::config::COMMAND_QUEUE_CAPACITY;
use crate::{EngineConfig, Error, InstrumentId, Result};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reserved id of the built-in instrument.
pub const DEFAULT_INSTRUMENT_ID: InstrumentId = 0;
pub const DEFAULT_INSTRUMENT_NAME: &str = "Default Sine Wave";
pub const DEFAULT_INSTRUMENT_VOLUME: f32 = 1.0;

/// Snapshot of one loaded instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentInfo {
    pub id: InstrumentId,
    pub kind: InstrumentKind,
    pub name: String,
    pub volume: f32,
    /// Ascending note numbers currently held.
    pub active_notes: Vec<u8>,
}

pub(super) struct Instrument {
    pub(super) id: InstrumentId,
    pub(super) kind: InstrumentKind,
    name: String,
    pub(super) volume: f32,
    pub(super) active: NoteSet,
    pub(super) velocities: [u8; NOTE_COUNT],
}

impl Instrument {
    fn new(id: InstrumentId, kind: InstrumentKind, name: String) -> Self {
        Self {
            id,
            kind,
            name,
            volume: DEFAULT_INSTRUMENT_VOLUME,
            active: NoteSet::new(),
            velocities: [0; NOTE_COUNT],
        }
    }

    fn info(&self) -> InstrumentInfo {
        InstrumentInfo {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            volume: self.volume,
            active_notes: self.active.iter().collect(),
        }
    }
}

pub(super) struct RegistryState {
    pub(super) arena: Arena<Instrument>,
    ids: HashMap<InstrumentId, InstrumentHandle>,
    next_id: InstrumentId,
}

impl RegistryState {
    fn lookup(&self, id: InstrumentId) -> Option<(InstrumentHandle, &Instrument)> {
        let handle = *self.ids.get(&id)?;
        self.arena.get(handle).map(|instrument| (handle, instrument))
    }

    fn lookup_mut(&mut self, id: InstrumentId) -> Option<(InstrumentHandle, &mut Instrument)> {
        let handle = *self.ids.get(&id)?;
        self.arena.get_mut(handle).map(|instrument| (handle, instrument))
    }
}

pub(super) struct RegistryInner {
    pub(super) state: Mutex<RegistryState>,
    commands: Sender<VoiceCommand>,
    /// Set when the queue overflowed. Only written with `state` held.
    /// While set nothing is queued and the renderer rebuilds from `state`.
    pub(super) overflowed: AtomicBool,
    max_instruments: usize,
    fallback: bool,
}

/// Instrument table shared by control threads.
///
/// Every mutation is validated and recorded here, then forwarded to the paired
/// [`InstrumentRenderer`] as a command over a queue bounded by
/// [`COMMAND_QUEUE_CAPACITY`]. The table is authoritative: when the queue is
/// full (a stopped engine never drains it) further commands are dropped and
/// the renderer rebuilds its voices from the table on its next pass.
///
/// # RT Safety
///
/// - All methods lock the table and are meant for control threads.
/// - Commands are queued while the lock is held, so the renderer observes them
///   in the same order the table recorded them.
/// - The renderer only ever `try_lock`s the table, and only after an overflow.
#[derive(Clone)]
pub struct InstrumentRegistry {
    inner: Arc<RegistryInner>,
}

impl InstrumentRegistry {
    /// Create a registry and the renderer it feeds.
    pub fn new(config: &EngineConfig) -> (Self, InstrumentRenderer) {
        let (tx, rx) = bounded(COMMAND_QUEUE_CAPACITY);
        let inner = Arc::new(RegistryInner {
            state: Mutex::new(RegistryState {
                arena: Arena::with_capacity(config.max_instruments),
                ids: HashMap::with_capacity(config.max_instruments),
                next_id: DEFAULT_INSTRUMENT_ID + 1,
            }),
            commands: tx,
            overflowed: AtomicBool::new(false),
            max_instruments: config.max_instruments,
            fallback: config.unknown_instrument_fallback,
        });
        let renderer = InstrumentRenderer::new(rx, Arc::clone(&inner), config);
        (Self { inner }, renderer)
    }

    /// Create a sine instrument and return its new id.
    pub fn create_instrument(&self, kind: InstrumentKind, name: &str) -> Result<InstrumentId> {
        let mut state = self.inner.state.lock();
        let id = state.next_id;
        self.insert_locked(&mut state, id, kind, name)?;
        state.next_id += 1;
        info!(id, name, kind = kind.name(), "created instrument");
        Ok(id)
    }

    /// Create the reserved instrument 0. Idempotent.
    pub fn create_default_instrument(&self) -> Result<InstrumentId> {
        let mut state = self.inner.state.lock();
        if state.ids.contains_key(&DEFAULT_INSTRUMENT_ID) {
            return Ok(DEFAULT_INSTRUMENT_ID);
        }
        self.insert_locked(
            &mut state,
            DEFAULT_INSTRUMENT_ID,
            InstrumentKind::Sine,
            DEFAULT_INSTRUMENT_NAME,
        )?;
        info!("created default instrument");
        Ok(DEFAULT_INSTRUMENT_ID)
    }

    fn insert_locked(
        &self,
        state: &mut RegistryState,
        id: InstrumentId,
        kind: InstrumentKind,
        name: &str,
    ) -> Result<()> {
        let max = self.inner.max_instruments;
        let instrument = Instrument::new(id, kind, name.to_string());
        let volume = instrument.volume;
        let handle = state.arena.insert(instrument).ok_or_else(|| {
            error!(max, "maximum number of instruments reached");
            Error::CapacityExceeded { max }
        })?;
        state.ids.insert(id, handle);
        self.send(VoiceCommand::Load {
            handle,
            id,
            kind,
            volume,
        });
        Ok(())
    }

    /// Remove an instrument; its sounding notes stop with it.
    pub fn unload_instrument(&self, id: InstrumentId) -> Result<()> {
        let mut state = self.inner.state.lock();
        let Some(handle) = state.ids.remove(&id) else {
            warn!(id, "unload: instrument not found");
            return Err(Error::InstrumentNotFound(id));
        };
        state.arena.remove(handle);
        self.send(VoiceCommand::Unload { handle });
        info!(id, "unloaded instrument");
        Ok(())
    }

    /// Set an instrument's gain, clamped to [0, 1]. Returns the applied value.
    pub fn set_volume(&self, id: InstrumentId, volume: f32) -> Result<f32> {
        let applied = clamp_unit(volume);
        if applied != volume {
            warn!(id, volume, applied, "instrument volume clamped");
        }
        let mut state = self.inner.state.lock();
        let Some((handle, instrument)) = state.lookup_mut(id) else {
            warn!(id, "set_volume: instrument not found");
            return Err(Error::InstrumentNotFound(id));
        };
        instrument.volume = applied;
        self.send(VoiceCommand::SetVolume {
            handle,
            volume: applied,
        });
        Ok(applied)
    }

    /// Start (or retrigger) a note.
    ///
    /// Velocity is clamped to 1..=127. An unknown instrument falls back to
    /// instrument 0 when the fallback is enabled and instrument 0 exists.
    /// Returns the id of the instrument that actually sounds.
    pub fn note_on(&self, id: InstrumentId, note: i32, velocity: i32) -> Result<InstrumentId> {
        let note = validate_note(note).inspect_err(|_| warn!(id, note, "note_on: invalid note"))?;
        let clamped = clamp_velocity(velocity);
        if clamped as i32 != velocity {
            warn!(velocity, clamped, "note velocity clamped");
        }

        let mut state = self.inner.state.lock();
        let target = if state.ids.contains_key(&id) {
            id
        } else if self.inner.fallback && state.ids.contains_key(&DEFAULT_INSTRUMENT_ID) {
            warn!(id, "note_on: unknown instrument, using default instrument");
            DEFAULT_INSTRUMENT_ID
        } else {
            warn!(id, "note_on: instrument not found");
            return Err(Error::InstrumentNotFound(id));
        };

        let Some((handle, instrument)) = state.lookup_mut(target) else {
            return Err(Error::InstrumentNotFound(target));
        };
        instrument.active.insert(note);
        instrument.velocities[note as usize] = clamped;
        self.send(VoiceCommand::NoteOn {
            handle,
            note,
            velocity: clamped,
        });
        debug!(instrument = target, note, velocity = clamped, "note on");
        Ok(target)
    }

    /// Release a note. Returns whether it was sounding.
    pub fn note_off(&self, id: InstrumentId, note: i32) -> Result<bool> {
        let note = validate_note(note).inspect_err(|_| warn!(id, note, "note_off: invalid note"))?;
        let mut state = self.inner.state.lock();
        let Some((handle, instrument)) = state.lookup_mut(id) else {
            warn!(id, "note_off: instrument not found");
            return Err(Error::InstrumentNotFound(id));
        };
        if !instrument.active.remove(note) {
            warn!(instrument = id, note, "note_off: note was not active");
            return Ok(false);
        }
        instrument.velocities[note as usize] = 0;
        self.send(VoiceCommand::NoteOff { handle, note });
        debug!(instrument = id, note, "note off");
        Ok(true)
    }

    pub fn contains(&self, id: InstrumentId) -> bool {
        self.inner.state.lock().ids.contains_key(&id)
    }

    pub fn instrument(&self, id: InstrumentId) -> Option<InstrumentInfo> {
        let state = self.inner.state.lock();
        state.lookup(id).map(|(_, instrument)| instrument.info())
    }

    /// Loaded ids in ascending order.
    pub fn instrument_ids(&self) -> Vec<InstrumentId> {
        let state = self.inner.state.lock();
        let mut ids: Vec<_> = state.arena.iter().map(|(_, inst)| inst.id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn active_notes(&self, id: InstrumentId) -> Option<Vec<u8>> {
        let state = self.inner.state.lock();
        state
            .lookup(id)
            .map(|(_, instrument)| instrument.active.iter().collect())
    }

    /// Velocity of a held note, `None` if the note is not sounding.
    pub fn note_velocity(&self, id: InstrumentId, note: u8) -> Option<u8> {
        let state = self.inner.state.lock();
        let (_, instrument) = state.lookup(id)?;
        instrument
            .active
            .contains(note)
            .then(|| instrument.velocities[note as usize & 0x7f])
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.max_instruments
    }

    /// Commands queued for the renderer and not yet applied.
    pub fn pending_commands(&self) -> usize {
        self.inner.commands.len()
    }

    // Callers hold the state lock.
    fn send(&self, command: VoiceCommand) {
        if self.inner.overflowed.load(Ordering::Acquire) {
            return;
        }
        match self.inner.commands.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                self.inner.overflowed.store(true, Ordering::Release);
                warn!(
                    ?command,
                    capacity = COMMAND_QUEUE_CAPACITY,
                    "command queue full, renderer will resync from the table"
                );
            }
            // A disconnected renderer has nothing left to drive.
            Err(TrySendError::Disconnected(command)) => {
                debug!(?command, "renderer dropped, command discarded");
            }
        }
    }
}
