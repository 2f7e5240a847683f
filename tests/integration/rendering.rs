//! Rendering tests
//!
//! Covers the renderer directly and buffers pulled from a running engine.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use multitrack::core::InstrumentKind;
use multitrack::core::InstrumentRenderer;
use proptest::prelude::*;

const CHANNELS: usize = 2;

fn render(renderer: &mut InstrumentRenderer, frames: usize, master: f32) -> Vec<f32> {
    let mut buffer = vec![0.0; frames * CHANNELS];
    renderer.render(&mut buffer, frames, master).unwrap();
    buffer
}

#[test]
fn test_lead_note_scenario() {
    let (registry, mut renderer) = instrument_pair();
    let lead = registry
        .create_instrument(InstrumentKind::Sine, "lead")
        .unwrap();
    assert_eq!(lead, 1);

    registry.note_on(lead, 60, 100).unwrap();
    let buffer = render(&mut renderer, 512, 1.0);
    assert_eq!(buffer.len(), 1024);
    assert_has_audio(&buffer, 0.01);
    assert!(peak(&buffer) < 1.0);

    assert!(registry.note_off(lead, 60).unwrap());
    let buffer = render(&mut renderer, 512, 1.0);
    assert!(buffer.iter().all(|&s| s == 0.0));
}

#[test]
fn test_single_note_level() {
    let (registry, mut renderer) = instrument_pair();
    let lead = registry
        .create_instrument(InstrumentKind::Sine, "lead")
        .unwrap();
    registry.note_on(lead, 69, 127).unwrap();

    let buffer = render(&mut renderer, 2048, 1.0);
    assert_abs_diff_eq!(peak(&buffer), 0.15_f32.tanh(), epsilon = 1e-3);

    let (left, right) = split_stereo(&buffer);
    assert_eq!(left, right);
}

#[test]
fn test_chord_is_normalized() {
    let (registry, mut renderer) = instrument_pair();
    let pad = registry
        .create_instrument(InstrumentKind::Sine, "pad")
        .unwrap();
    for note in [48, 55, 60, 64, 67, 72, 76, 79] {
        registry.note_on(pad, note, 127).unwrap();
    }

    let buffer = render(&mut renderer, 4096, 1.0);
    // Eight voices sum to at most 0.15 * sqrt(8) before the limiter.
    let bound = (0.15_f32 * 8.0_f32.sqrt()).tanh();
    assert!(peak(&buffer) <= bound + FLOAT_EPSILON);
    assert_has_audio(&buffer, 0.01);
}

#[test]
fn test_phase_continuity_across_calls() {
    let (registry_a, mut whole) = instrument_pair();
    let (registry_b, mut split) = instrument_pair();
    for registry in [&registry_a, &registry_b] {
        let id = registry
            .create_instrument(InstrumentKind::Sine, "lead")
            .unwrap();
        registry.note_on(id, 60, 100).unwrap();
        registry.note_on(id, 67, 80).unwrap();
    }

    let one = render(&mut whole, TEST_BUFFER_SIZE, 1.0);
    let mut two = render(&mut split, TEST_BUFFER_SIZE / 2, 1.0);
    two.extend(render(&mut split, TEST_BUFFER_SIZE / 2, 1.0));

    for note in [60, 67] {
        let a = whole.phase(1, note).unwrap();
        let b = split.phase(1, note).unwrap();
        assert!((a - b).abs() < PHASE_EPSILON, "note {note}: {a} vs {b}");
    }
    for (a, b) in one.iter().zip(&two) {
        assert!((a - b).abs() < FLOAT_EPSILON);
    }
}

#[test]
fn test_master_volume_scales_output() {
    let (registry, mut renderer) = instrument_pair();
    let lead = registry
        .create_instrument(InstrumentKind::Sine, "lead")
        .unwrap();
    registry.note_on(lead, 69, 127).unwrap();

    let muted = render(&mut renderer, 512, 0.0);
    assert!(muted.iter().all(|&s| s == 0.0));
    let quiet = render(&mut renderer, 2048, 0.5);
    assert_abs_diff_eq!(peak(&quiet), 0.075_f32.tanh(), epsilon = 1e-3);
}

#[test]
fn test_engine_renders_held_note() {
    let (engine, output) = running_engine();
    let lead = engine.create_instrument("lead").unwrap();
    engine.note_on(lead, 60, 100).unwrap();

    let buffer = pull_f32(&output);
    assert_eq!(buffer.len(), TEST_BUFFER_SIZE * 2);
    assert_has_audio(&buffer, 0.01);
    assert!(peak(&buffer) < 1.0);
    let (left, right) = split_stereo(&buffer);
    assert_eq!(left, right);

    engine.note_off(lead, 60).unwrap();
    assert_silence(&pull_f32(&output), SILENCE_THRESHOLD);
}

#[test]
fn test_engine_output_matches_renderer() {
    let (engine, output) = running_engine();
    let lead = engine.create_instrument("lead").unwrap();
    engine.note_on(lead, 64, 90).unwrap();
    let pulled = pull_f32(&output);

    let (registry, mut renderer) = instrument_pair();
    let id = registry
        .create_instrument(InstrumentKind::Sine, "lead")
        .unwrap();
    registry.note_on(id, 64, 90).unwrap();
    let reference = render(&mut renderer, TEST_BUFFER_SIZE, 1.0);

    for (a, b) in pulled.iter().zip(&reference) {
        assert!((a - b).abs() <= 2.0 * INT16_EPSILON);
    }
}

#[test]
fn test_engine_master_volume_mutes() {
    let (engine, output) = running_engine();
    engine.play_test_tone().unwrap();
    engine.set_master_volume(0.0);
    assert_silence(&pull_f32(&output), SILENCE_THRESHOLD);
    engine.set_master_volume(1.0);
    assert_has_audio(&pull_f32(&output), 0.01);
}

#[test]
fn test_engine_buffers_alternate() {
    let (engine, output) = running_engine();
    let first = engine.with_render_engine(|render| render.current_index());
    output.pull();
    let second = engine.with_render_engine(|render| render.current_index());
    output.pull();
    let third = engine.with_render_engine(|render| render.current_index());
    assert_ne!(first, second);
    assert_eq!(first, third);
}

#[test]
fn test_notes_survive_stop_and_start() {
    let (engine, output) = running_engine();
    engine.play_test_tone().unwrap();
    engine.stop().unwrap();
    engine.start().unwrap();

    let primer = output.pull().unwrap();
    assert!(primer.iter().all(|&s| s == 0));
    assert_has_audio(&pull_f32(&output), 0.01);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engine_pcm_stays_in_range(
        notes in prop::collection::vec((0i32..128, 1i32..=127), 1..64),
        master in 0.0f32..=1.0,
    ) {
        let (engine, output) = running_engine();
        engine.set_master_volume(master);
        for (note, velocity) in notes {
            engine.note_on(0, note, velocity).unwrap();
        }
        let buffer = pull_f32(&output);
        prop_assert!(buffer.iter().all(|s| (-1.0..=1.0).contains(s)));
        prop_assert!(peak(&buffer) < 1.0);
    }
}
