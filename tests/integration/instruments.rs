//! Instrument management through the engine

use crate::helpers::*;
use multitrack::prelude::*;
use multitrack::{midi_to_frequency, ErrorKind};

#[test]
fn test_midi_to_frequency() {
    assert_eq!(midi_to_frequency(69), 440.0);
    assert!((midi_to_frequency(81) - 880.0).abs() < 1e-3);
    assert!((midi_to_frequency(60) - 261.6256).abs() < 1e-3);
}

#[test]
fn test_ids_are_sequential_and_not_reused() {
    let (engine, _output) = test_engine();
    assert_eq!(engine.create_instrument("lead").unwrap(), 1);
    assert_eq!(engine.create_instrument("pad").unwrap(), 2);
    engine.unload_instrument(1).unwrap();
    assert_eq!(engine.create_instrument("bass").unwrap(), 3);
    assert_eq!(engine.instrument_ids(), vec![0, 2, 3]);
}

#[test]
fn test_capacity_includes_default_instrument() {
    init_tracing();
    let engine = MultitrackEngine::builder()
        .max_instruments(3)
        .no_output()
        .build()
        .unwrap();
    engine.create_instrument("a").unwrap();
    engine.create_instrument("b").unwrap();
    let err = engine.create_instrument("c").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

    // Unloading frees a slot.
    engine.unload_instrument(1).unwrap();
    assert_eq!(engine.create_instrument("c").unwrap(), 3);
}

#[test]
fn test_note_on_and_off() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();

    engine.note_on(lead, 60, 100).unwrap();
    let info = engine.instrument(lead).unwrap();
    assert_eq!(info.active_notes, vec![60]);

    engine.note_off(lead, 60).unwrap();
    assert!(engine.instrument(lead).unwrap().active_notes.is_empty());

    // Releasing again succeeds without effect.
    engine.note_off(lead, 60).unwrap();
    assert!(engine.instrument(lead).unwrap().active_notes.is_empty());
}

#[test]
fn test_velocity_is_clamped() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    let registry = engine.instruments();

    engine.note_on(lead, 60, 0).unwrap();
    assert_eq!(registry.note_velocity(lead, 60), Some(1));
    engine.note_on(lead, 61, 500).unwrap();
    assert_eq!(registry.note_velocity(lead, 61), Some(127));
    engine.note_on(lead, 62, -20).unwrap();
    assert_eq!(registry.note_velocity(lead, 62), Some(1));
}

#[test]
fn test_invalid_note_rejected() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    for note in [-1, 128, 1000] {
        let err = engine.note_on(lead, note, 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(engine.note_off(lead, note).unwrap_err().kind(), ErrorKind::OutOfRange);
    }
    assert!(engine.instrument(lead).unwrap().active_notes.is_empty());
}

#[test]
fn test_unknown_instrument_falls_back_to_default() {
    let (engine, _output) = test_engine();
    engine.note_on(42, 64, 90).unwrap();
    assert_eq!(engine.instrument(0).unwrap().active_notes, vec![64]);

    // Release goes to the instrument that exists.
    assert_eq!(engine.note_off(42, 64).unwrap_err().kind(), ErrorKind::NotFound);
    engine.note_off(0, 64).unwrap();
}

#[test]
fn test_fallback_can_be_disabled() {
    init_tracing();
    let engine = MultitrackEngine::builder()
        .unknown_instrument_fallback(false)
        .no_output()
        .build()
        .unwrap();
    let err = engine.note_on(42, 64, 90).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(engine.instrument(0).unwrap().active_notes.is_empty());
}

#[test]
fn test_unload_clears_notes() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    engine.note_on(lead, 60, 100).unwrap();
    engine.note_on(lead, 64, 100).unwrap();

    engine.unload_instrument(lead).unwrap();
    assert!(engine.instrument(lead).is_none());
    assert!(engine.instruments().active_notes(lead).is_none());
    assert_eq!(engine.unload_instrument(lead).unwrap_err().kind(), ErrorKind::NotFound);

    // Falls back to instrument 0 rather than reviving the unloaded one.
    engine.note_on(lead, 60, 100).unwrap();
    assert!(engine.instrument(lead).is_none());
    assert_eq!(engine.instrument(0).unwrap().active_notes, vec![60]);
}

#[test]
fn test_instrument_volume() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    assert_eq!(engine.set_instrument_volume(lead, 0.5).unwrap(), 0.5);
    assert_eq!(engine.instrument(lead).unwrap().volume, 0.5);
    assert_eq!(engine.set_instrument_volume(lead, 2.0).unwrap(), 1.0);
    assert_eq!(
        engine.set_instrument_volume(77, 0.5).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_test_tone() {
    let (engine, _output) = test_engine();
    engine.play_test_tone().unwrap();
    assert_eq!(engine.instrument(0).unwrap().active_notes, vec![60]);
    engine.stop_test_tone().unwrap();
    assert!(engine.instrument(0).unwrap().active_notes.is_empty());
}

#[test]
fn test_stop_test_tone_releases_every_instrument() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    engine.note_on(lead, 58, 100).unwrap();
    engine.note_on(lead, 62, 100).unwrap();
    engine.note_on(lead, 70, 100).unwrap();

    engine.stop_test_tone().unwrap();
    assert_eq!(engine.instrument(lead).unwrap().active_notes, vec![70]);
}

#[test]
fn test_stop_test_tone_without_instruments_fails() {
    init_tracing();
    let engine = MultitrackEngine::builder()
        .default_instrument(false)
        .no_output()
        .build()
        .unwrap();
    assert_eq!(engine.stop_test_tone().unwrap_err().kind(), ErrorKind::NotFound);
}
