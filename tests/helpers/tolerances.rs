//! Tolerance constants for audio testing.
//!
//! Different operations require different precision levels.

/// Floating point rounding errors (exact gain, identical code paths).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Oscillator phase comparisons after many accumulated increments.
pub const PHASE_EPSILON: f32 = 1e-3;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// 16-bit quantization step size.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;
