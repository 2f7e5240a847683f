//! Sequences, tracks and notes.

use crate::{NoteId, SequenceId, TrackId};
use multitrack_core::InstrumentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Tempo used when a sequence is created with a non-positive tempo.
pub const DEFAULT_TEMPO: u32 = 120;

/// Duration, in beats, given to notes created with a non-positive duration.
pub const DEFAULT_NOTE_DURATION: f64 = 0.1;

/// A note scheduled on a track. Times are in beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub note_number: u8,
    pub velocity: u8,
    pub start_time: f64,
    pub duration: f64,
}

impl Note {
    /// True for notes that sound as soon as playback starts.
    pub fn starts_immediately(&self) -> bool {
        self.start_time <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    /// Checked against the instrument registry only when notes are added.
    pub instrument_id: InstrumentId,
    pub notes: BTreeMap<NoteId, Note>,
    pub volume: f32,
}

impl Track {
    pub(crate) fn new(id: TrackId, instrument_id: InstrumentId) -> Self {
        Self {
            id,
            instrument_id,
            notes: BTreeMap::new(),
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: SequenceId,
    /// Beats per minute.
    pub tempo: u32,
    pub tracks: BTreeMap<TrackId, Track>,
    pub is_playing: bool,
}

impl Sequence {
    pub(crate) fn new(id: SequenceId, tempo: u32) -> Self {
        Self {
            id,
            tempo,
            tracks: BTreeMap::new(),
            is_playing: false,
        }
    }

    pub fn note_count(&self) -> usize {
        self.tracks.values().map(|track| track.notes.len()).sum()
    }
}

pub(crate) fn sanitize_tempo(tempo: i32) -> u32 {
    if tempo > 0 {
        tempo as u32
    } else {
        warn!(tempo, "invalid tempo, using {DEFAULT_TEMPO}");
        DEFAULT_TEMPO
    }
}

pub(crate) fn sanitize_start_time(start_time: f64) -> f64 {
    if start_time.is_finite() && start_time >= 0.0 {
        start_time
    } else {
        warn!(start_time, "invalid start time, using 0");
        0.0
    }
}

pub(crate) fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        warn!(duration, "invalid duration, using {DEFAULT_NOTE_DURATION}");
        DEFAULT_NOTE_DURATION
    }
}
