//! Per-note oscillator bookkeeping and MIDI helpers.

use crate::{Error, Result};
use std::f32::consts::TAU;

/// Number of addressable MIDI notes.
pub const NOTE_COUNT: usize = 128;

pub const MIN_VELOCITY: u8 = 1;
pub const MAX_VELOCITY: u8 = 127;

/// A4 reference.
pub const A4_NOTE: u8 = 69;
pub const A4_FREQ: f32 = 440.0;

/// Equal-tempered frequency of a MIDI note.
#[inline]
pub fn midi_to_frequency(note: u8) -> f32 {
    A4_FREQ * 2.0f32.powf((note as f32 - A4_NOTE as f32) / 12.0)
}

/// Phase advance per sample, in radians.
#[inline]
pub fn phase_increment(frequency: f32, sample_rate: f32) -> f32 {
    TAU * frequency / sample_rate
}

/// Reject note numbers outside 0..=127.
pub fn validate_note(note: i32) -> Result<u8> {
    u8::try_from(note)
        .ok()
        .filter(|n| (*n as usize) < NOTE_COUNT)
        .ok_or(Error::InvalidNote(note))
}

/// Clamp a velocity into 1..=127.
#[inline]
pub fn clamp_velocity(velocity: i32) -> u8 {
    velocity.clamp(MIN_VELOCITY as i32, MAX_VELOCITY as i32) as u8
}

/// Clamp a gain into [0, 1]; NaN becomes silence.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Phase and velocity of one sounding note.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OscillatorState {
    pub velocity: u8,
    /// Radians, always in `[0, 2π)`.
    pub phase: f32,
}

impl OscillatorState {
    /// Fresh state for a (re)triggered note.
    pub fn trigger(velocity: u8) -> Self {
        Self { velocity, phase: 0.0 }
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.velocity as f32 / MAX_VELOCITY as f32
    }

    #[inline]
    pub fn advance(&mut self, increment: f32) {
        self.phase += increment;
        if self.phase >= TAU {
            self.phase %= TAU;
        }
    }
}

/// Set of MIDI notes backed by a 128-bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteSet(u128);

impl NoteSet {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Returns true if the note was not already present.
    #[inline]
    pub fn insert(&mut self, note: u8) -> bool {
        let bit = Self::bit(note);
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    /// Returns true if the note was present.
    #[inline]
    pub fn remove(&mut self, note: u8) -> bool {
        let bit = Self::bit(note);
        let present = self.0 & bit != 0;
        self.0 &= !bit;
        present
    }

    #[inline]
    pub fn contains(&self, note: u8) -> bool {
        self.0 & Self::bit(note) != 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Ascending note numbers.
    pub fn iter(&self) -> NoteSetIter {
        NoteSetIter(self.0)
    }

    #[inline]
    fn bit(note: u8) -> u128 {
        1u128 << (note & 0x7f)
    }
}

pub struct NoteSetIter(u128);

impl Iterator for NoteSetIter {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let note = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(note)
    }
}
