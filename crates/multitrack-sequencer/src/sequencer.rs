//! Sequence store and zero-offset playback.

use crate::model::{sanitize_duration, sanitize_start_time, sanitize_tempo, Note, Sequence, Track};
use crate::transport::{TransitionResult, Transport, TransportEvent, TransportState};
use crate::{Error, NoteId, Result, SequenceId, TrackId};
use multitrack_core::instrument::{clamp_unit, clamp_velocity, validate_note};
use multitrack_core::{InstrumentId, InstrumentRegistry};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

struct SequencerState {
    sequences: BTreeMap<SequenceId, Sequence>,
    transport: Transport,
    /// Instrument each triggered note actually sounded on.
    sounding: BTreeMap<NoteId, InstrumentId>,
    next_sequence_id: SequenceId,
    next_track_id: TrackId,
    next_note_id: NoteId,
}

/// Owns every sequence and drives note-on/off into the instrument registry.
///
/// Playback is zero-offset only: starting a sequence sounds each note whose
/// start time is at or before beat 0, and stopping releases them. Notes that
/// start later are stored but not scheduled.
///
/// All state sits behind one lock. The registry lock is taken while it is
/// held, never the other way round.
pub struct Sequencer {
    state: Mutex<SequencerState>,
    instruments: InstrumentRegistry,
}

impl Sequencer {
    pub fn new(instruments: InstrumentRegistry) -> Self {
        Self {
            state: Mutex::new(SequencerState {
                sequences: BTreeMap::new(),
                transport: Transport::new(),
                sounding: BTreeMap::new(),
                next_sequence_id: 1,
                next_track_id: 1,
                next_note_id: 1,
            }),
            instruments,
        }
    }

    /// Create an empty sequence. Non-positive tempos become 120 bpm.
    pub fn create_sequence(&self, tempo: i32) -> SequenceId {
        let tempo = sanitize_tempo(tempo);
        let mut state = self.state.lock();
        let id = state.next_sequence_id;
        state.next_sequence_id += 1;
        state.sequences.insert(id, Sequence::new(id, tempo));
        info!(sequence = id, tempo, "created sequence");
        id
    }

    /// Add a track bound to `instrument_id`. The instrument is not checked here.
    pub fn add_track(&self, sequence: SequenceId, instrument_id: InstrumentId) -> Result<TrackId> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let seq = sequence_mut(&mut state.sequences, sequence)?;
        let id = state.next_track_id;
        state.next_track_id += 1;
        seq.tracks.insert(id, Track::new(id, instrument_id));
        debug!(sequence, track = id, instrument = instrument_id, "added track");
        Ok(id)
    }

    /// Add a note to a track.
    ///
    /// Velocity is clamped to 1..=127, a negative start becomes 0 and a
    /// non-positive duration becomes 0.1 beats. Fails if the note number is
    /// out of range or the track's instrument is not loaded. If this sequence
    /// is playing and the note starts at beat 0, it sounds immediately.
    pub fn add_note(
        &self,
        sequence: SequenceId,
        track: TrackId,
        note_number: i32,
        velocity: i32,
        start_time: f64,
        duration: f64,
    ) -> Result<NoteId> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let playing = state.transport.is_playing_sequence(sequence);
        let trk = track_mut(&mut state.sequences, sequence, track)?;

        let note_number = validate_note(note_number).inspect_err(|_| {
            warn!(sequence, track, note_number, "add_note: invalid note");
        })?;
        let clamped = clamp_velocity(velocity);
        if clamped as i32 != velocity {
            warn!(velocity, clamped, "note velocity clamped");
        }
        let start_time = sanitize_start_time(start_time);
        let duration = sanitize_duration(duration);

        if !self.instruments.contains(trk.instrument_id) {
            warn!(instrument = trk.instrument_id, "add_note: instrument not found");
            return Err(multitrack_core::Error::InstrumentNotFound(trk.instrument_id).into());
        }

        let id = state.next_note_id;
        state.next_note_id += 1;
        let note = Note {
            id,
            note_number,
            velocity: clamped,
            start_time,
            duration,
        };
        debug!(sequence, track, note = id, note_number, start_time, duration, "added note");

        if playing && note.starts_immediately() {
            trigger(&self.instruments, &mut state.sounding, trk.instrument_id, &note);
        }
        trk.notes.insert(id, note);
        Ok(id)
    }

    /// Remove a note, releasing it first if its sequence is playing.
    pub fn delete_note(&self, sequence: SequenceId, track: TrackId, note: NoteId) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let playing = state.transport.is_playing_sequence(sequence);
        let trk = track_mut(&mut state.sequences, sequence, track)?;
        let Some(removed) = trk.notes.remove(&note) else {
            warn!(track, note, "delete_note: note not found");
            return Err(Error::NoteNotFound { track, note });
        };
        if playing {
            release(&self.instruments, &mut state.sounding, trk.instrument_id, &removed);
        }
        debug!(sequence, track, note, "deleted note");
        Ok(())
    }

    /// Remove a track, releasing its notes first if its sequence is playing.
    pub fn delete_track(&self, sequence: SequenceId, track: TrackId) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let playing = state.transport.is_playing_sequence(sequence);
        let seq = sequence_mut(&mut state.sequences, sequence)?;
        let Some(removed) = seq.tracks.remove(&track) else {
            warn!(sequence, track, "delete_track: track not found");
            return Err(Error::TrackNotFound { sequence, track });
        };
        if playing {
            for note in removed.notes.values() {
                release(&self.instruments, &mut state.sounding, removed.instrument_id, note);
            }
        }
        debug!(sequence, track, "deleted track");
        Ok(())
    }

    /// Remove a sequence, stopping playback first if it is the active one.
    pub fn delete_sequence(&self, sequence: SequenceId) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if !state.sequences.contains_key(&sequence) {
            warn!(sequence, "delete_sequence: sequence not found");
            return Err(Error::SequenceNotFound(sequence));
        }
        if state.transport.is_playing_sequence(sequence) {
            self.stop_locked(state);
        }
        state.sequences.remove(&sequence);
        info!(sequence, "deleted sequence");
        Ok(())
    }

    /// Play a sequence, replacing whatever was playing.
    ///
    /// Sounds every note that starts at beat 0. A note whose instrument is
    /// gone is skipped with a warning; playback still starts.
    pub fn start_playback(&self, sequence: SequenceId) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if !state.sequences.contains_key(&sequence) {
            warn!(sequence, "start_playback: sequence not found");
            return Err(Error::SequenceNotFound(sequence));
        }
        if state.transport.is_playing() {
            self.stop_locked(state);
        }

        state.transport.transition(TransportEvent::Start(sequence));
        let seq = sequence_mut(&mut state.sequences, sequence)?;
        seq.is_playing = true;
        for track in seq.tracks.values() {
            for note in track.notes.values().filter(|note| note.starts_immediately()) {
                trigger(&self.instruments, &mut state.sounding, track.instrument_id, note);
            }
        }
        info!(sequence, "started playback");
        Ok(())
    }

    /// Stop the transport and release the active sequence's notes.
    /// A no-op when nothing is playing.
    pub fn stop_playback(&self) {
        let mut state = self.state.lock();
        if !state.transport.is_playing() {
            debug!("stop_playback: nothing playing");
            return;
        }
        self.stop_locked(&mut state);
    }

    fn stop_locked(&self, state: &mut SequencerState) {
        let TransitionResult::Stopped(id) = state.transport.transition(TransportEvent::Stop) else {
            return;
        };
        if let Some(seq) = state.sequences.get_mut(&id) {
            for track in seq.tracks.values() {
                for note in track.notes.values() {
                    release(&self.instruments, &mut state.sounding, track.instrument_id, note);
                }
            }
            seq.is_playing = false;
        }
        state.sounding.clear();
        info!(sequence = id, "stopped playback");
    }

    /// Set a track's gain, clamped to [0, 1]. Returns the stored value.
    pub fn set_track_volume(&self, sequence: SequenceId, track: TrackId, volume: f32) -> Result<f32> {
        let applied = clamp_unit(volume);
        if applied != volume {
            warn!(volume, applied, "track volume clamped");
        }
        let mut state = self.state.lock();
        let trk = track_mut(&mut state.sequences, sequence, track)?;
        trk.volume = applied;
        Ok(applied)
    }

    pub fn sequence(&self, id: SequenceId) -> Option<Sequence> {
        self.state.lock().sequences.get(&id).cloned()
    }

    pub fn sequence_ids(&self) -> Vec<SequenceId> {
        self.state.lock().sequences.keys().copied().collect()
    }

    pub fn active_sequence(&self) -> Option<SequenceId> {
        self.state.lock().transport.active_sequence()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().transport.is_playing()
    }

    pub fn transport_state(&self) -> TransportState {
        self.state.lock().transport.state()
    }

    pub fn instruments(&self) -> &InstrumentRegistry {
        &self.instruments
    }
}

fn sequence_mut(
    sequences: &mut BTreeMap<SequenceId, Sequence>,
    sequence: SequenceId,
) -> Result<&mut Sequence> {
    sequences.get_mut(&sequence).ok_or_else(|| {
        warn!(sequence, "sequence not found");
        Error::SequenceNotFound(sequence)
    })
}

fn track_mut(
    sequences: &mut BTreeMap<SequenceId, Sequence>,
    sequence: SequenceId,
    track: TrackId,
) -> Result<&mut Track> {
    sequence_mut(sequences, sequence)?
        .tracks
        .get_mut(&track)
        .ok_or_else(|| {
            warn!(sequence, track, "track not found");
            Error::TrackNotFound { sequence, track }
        })
}

fn trigger(
    instruments: &InstrumentRegistry,
    sounding: &mut BTreeMap<NoteId, InstrumentId>,
    instrument: InstrumentId,
    note: &Note,
) {
    match instruments.note_on(instrument, note.note_number as i32, note.velocity as i32) {
        Ok(target) => {
            sounding.insert(note.id, target);
        }
        Err(e) => warn!(instrument, note = note.note_number, "failed to trigger note: {e}"),
    }
}

fn release(
    instruments: &InstrumentRegistry,
    sounding: &mut BTreeMap<NoteId, InstrumentId>,
    instrument: InstrumentId,
    note: &Note,
) {
    let target = sounding.remove(&note.id).unwrap_or(instrument);
    if let Err(e) = instruments.note_off(target, note.note_number as i32) {
        debug!(instrument = target, note = note.note_number, "release skipped: {e}");
    }
}
