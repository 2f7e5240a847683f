//! Instrument kinds and their synthesis strategies.

use serde::{Deserialize, Serialize};

/// Kind of sound source an instrument renders.
///
/// Each kind indexes [`STRATEGIES`]; adding a kind means adding a row there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum InstrumentKind {
    #[default]
    Sine,
}

/// How one instrument kind turns oscillator phase into a sample.
#[derive(Debug)]
pub struct SynthesisStrategy {
    pub name: &'static str,
    /// Maps a phase in `[0, 2π)` to a sample in `[-1, 1]`.
    pub oscillator: fn(f32) -> f32,
}

static STRATEGIES: [SynthesisStrategy; 1] = [SynthesisStrategy {
    name: "sine",
    oscillator: sine,
}];

#[inline]
fn sine(phase: f32) -> f32 {
    phase.sin()
}

impl InstrumentKind {
    #[inline]
    pub fn strategy(self) -> &'static SynthesisStrategy {
        &STRATEGIES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.strategy().name
    }
}
