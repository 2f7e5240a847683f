//! Status-code bridge driven end to end

use crate::helpers::tolerances::*;
use crate::helpers::*;
use multitrack::prelude::*;

fn bridge_with_output() -> (EngineBridge, MemoryDevice) {
    init_tracing();
    let output = MemoryDevice::new(2);
    let mut bridge = EngineBridge::new();
    assert!(bridge.init_with(
        MultitrackEngine::builder()
            .sample_rate(TEST_SAMPLE_RATE)
            .device(output.clone())
    ));
    (bridge, output)
}

#[test]
fn test_lead_scenario() {
    let (bridge, output) = bridge_with_output();
    assert!(bridge.start());
    output.pull();

    let lead = bridge.create_instrument("lead");
    assert_eq!(lead, 1);
    assert!(bridge.note_on(lead, 60, 100));
    assert_has_audio(&pull_f32(&output), 0.01);

    assert!(bridge.note_off(lead, 60));
    assert_silence(&pull_f32(&output), SILENCE_THRESHOLD);
    assert!(bridge.stop());
}

#[test]
fn test_sequence_lifecycle() {
    let (bridge, output) = bridge_with_output();
    assert!(bridge.start());
    output.pull();

    let seq = bridge.create_sequence(-5);
    let track = bridge.add_track(seq, 0);
    assert!(track > 0);
    assert!(bridge.add_note(seq, track, 60, 100, 0.0, 1.0) > 0);
    assert_eq!(bridge.add_note(seq, track, 300, 100, 0.0, 1.0), -1);

    assert!(bridge.start_playback(seq));
    assert_has_audio(&pull_f32(&output), 0.01);
    assert!(bridge.stop_playback());
    assert_silence(&pull_f32(&output), SILENCE_THRESHOLD);

    let engine = bridge.engine().unwrap();
    assert_eq!(engine.sequence(seq as u32).unwrap().tempo, 120);
}

#[test]
fn test_capacity_sentinel() {
    init_tracing();
    let mut bridge = EngineBridge::new();
    assert!(bridge.init_with(
        MultitrackEngine::builder()
            .max_instruments(2)
            .no_output()
    ));
    assert_eq!(bridge.create_instrument("a"), 1);
    assert_eq!(bridge.create_instrument("b"), -1);
}

#[test]
fn test_start_without_device_fails() {
    init_tracing();
    let mut bridge = EngineBridge::new();
    assert!(bridge.init_with(MultitrackEngine::builder().no_output()));
    assert!(!bridge.start());
    assert!(bridge.stop());
}

#[test]
fn test_invalid_init_leaves_bridge_empty() {
    init_tracing();
    let mut bridge = EngineBridge::new();
    assert!(!bridge.init_with(MultitrackEngine::builder().sample_rate(1).no_output()));
    assert!(!bridge.is_initialized());
    assert!(!bridge.play_test_tone());
}

#[test]
fn test_master_volume_through_bridge() {
    let (bridge, _output) = bridge_with_output();
    bridge.set_master_volume(2.0);
    assert_eq!(bridge.engine().unwrap().master_volume(), 1.0);
    bridge.set_master_volume(0.3);
    assert_eq!(bridge.engine().unwrap().master_volume(), 0.3);
}

#[test]
fn test_instrument_volume_and_unload() {
    let (bridge, _output) = bridge_with_output();
    let lead = bridge.create_instrument("lead");
    assert!(bridge.set_instrument_volume(lead, 0.7));
    assert!(!bridge.set_instrument_volume(55, 0.7));
    assert!(bridge.unload_instrument(lead));
    assert!(!bridge.unload_instrument(lead));
}

#[test]
fn test_dispose_stops_output() {
    let (mut bridge, output) = bridge_with_output();
    assert!(bridge.start());
    assert!(output.is_playing());
    bridge.dispose();
    assert!(!output.is_playing());
    assert!(!bridge.note_on(0, 60, 100));
}
