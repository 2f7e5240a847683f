//! Float to device sample conversion.

/// Full-scale value of signed 16-bit PCM.
pub const I16_FULL_SCALE: f32 = i16::MAX as f32;

/// Convert `[-1, 1]` floats to 16-bit PCM, clamping out-of-range input.
///
/// Converts `min(input.len(), output.len())` samples. NaN maps to 0.
#[inline]
pub fn encode_i16(input: &[f32], output: &mut [i16]) {
    for (out, &sample) in output.iter_mut().zip(input) {
        *out = (sample.clamp(-1.0, 1.0) * I16_FULL_SCALE) as i16;
    }
}
