//! Sequence playback through the engine

use crate::helpers::tolerances::*;
use crate::helpers::*;
use multitrack::ErrorKind;

#[test]
fn test_playback_sounds_zero_offset_note() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    let seq = engine.create_sequence(120);
    let track = engine.add_track(seq, lead).unwrap();
    engine.add_note(seq, track, 60, 100, 0.0, 1.0).unwrap();

    engine.start_playback(seq).unwrap();
    assert_eq!(engine.instrument(lead).unwrap().active_notes, vec![60]);

    engine.stop_playback();
    assert!(engine.instrument(lead).unwrap().active_notes.is_empty());
}

#[test]
fn test_playback_is_audible() {
    let (engine, output) = running_engine();
    let lead = engine.create_instrument("lead").unwrap();
    let seq = engine.create_sequence(90);
    let track = engine.add_track(seq, lead).unwrap();
    engine.add_note(seq, track, 57, 110, 0.0, 2.0).unwrap();
    engine.add_note(seq, track, 64, 110, 0.0, 2.0).unwrap();

    engine.start_playback(seq).unwrap();
    let buffer = pull_f32(&output);
    assert_has_audio(&buffer, 0.01);
    assert!(peak(&buffer) < 1.0);

    engine.stop_playback();
    assert_silence(&pull_f32(&output), SILENCE_THRESHOLD);
}

#[test]
fn test_later_notes_are_stored_not_played() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    let seq = engine.create_sequence(120);
    let track = engine.add_track(seq, lead).unwrap();
    let later = engine.add_note(seq, track, 72, 100, 4.0, 1.0).unwrap();

    engine.start_playback(seq).unwrap();
    assert!(engine.instrument(lead).unwrap().active_notes.is_empty());

    let sequence = engine.sequence(seq).unwrap();
    assert!(sequence.is_playing);
    assert_eq!(sequence.tracks[&track].notes[&later].start_time, 4.0);
}

#[test]
fn test_multiple_tracks() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    let bass = engine.create_instrument("bass").unwrap();
    let seq = engine.create_sequence(120);
    let t1 = engine.add_track(seq, lead).unwrap();
    let t2 = engine.add_track(seq, bass).unwrap();
    engine.add_note(seq, t1, 72, 100, 0.0, 1.0).unwrap();
    engine.add_note(seq, t2, 36, 100, 0.0, 1.0).unwrap();

    engine.start_playback(seq).unwrap();
    assert_eq!(engine.instrument(lead).unwrap().active_notes, vec![72]);
    assert_eq!(engine.instrument(bass).unwrap().active_notes, vec![36]);

    engine.delete_track(seq, t2).unwrap();
    assert!(engine.instrument(bass).unwrap().active_notes.is_empty());
    assert_eq!(engine.instrument(lead).unwrap().active_notes, vec![72]);
    assert_eq!(engine.sequence(seq).unwrap().tracks.len(), 1);
}

#[test]
fn test_restart_retriggers() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    let seq = engine.create_sequence(120);
    let track = engine.add_track(seq, lead).unwrap();
    engine.add_note(seq, track, 60, 100, 0.0, 1.0).unwrap();

    engine.start_playback(seq).unwrap();
    engine.start_playback(seq).unwrap();
    assert_eq!(engine.sequencer().active_sequence(), Some(seq));
    assert_eq!(engine.instrument(lead).unwrap().active_notes, vec![60]);
}

#[test]
fn test_delete_playing_sequence() {
    let (engine, _output) = test_engine();
    let lead = engine.create_instrument("lead").unwrap();
    let seq = engine.create_sequence(120);
    let track = engine.add_track(seq, lead).unwrap();
    engine.add_note(seq, track, 60, 100, 0.0, 1.0).unwrap();
    engine.start_playback(seq).unwrap();

    engine.delete_sequence(seq).unwrap();
    assert!(!engine.sequencer().is_playing());
    assert!(engine.instrument(lead).unwrap().active_notes.is_empty());
    assert!(engine.sequence(seq).is_none());
    assert_eq!(engine.delete_sequence(seq).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_missing_ids_are_not_found() {
    let (engine, _output) = test_engine();
    let seq = engine.create_sequence(120);
    assert_eq!(engine.add_track(99, 0).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        engine.add_note(seq, 99, 60, 100, 0.0, 1.0).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(engine.delete_track(seq, 99).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(engine.delete_note(seq, 1, 1).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(engine.start_playback(99).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        engine.set_track_volume(seq, 99, 0.5).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_track_volume_is_stored() {
    let (engine, _output) = test_engine();
    let seq = engine.create_sequence(120);
    let track = engine.add_track(seq, 0).unwrap();
    assert_eq!(engine.set_track_volume(seq, track, 0.4).unwrap(), 0.4);
    assert_eq!(engine.set_track_volume(seq, track, -3.0).unwrap(), 0.0);
    assert_eq!(engine.sequence(seq).unwrap().tracks[&track].volume, 0.0);
}

#[test]
fn test_unloaded_instrument_does_not_block_playback() {
    init_tracing();
    let engine = multitrack::MultitrackEngine::builder()
        .unknown_instrument_fallback(false)
        .no_output()
        .build()
        .unwrap();
    let lead = engine.create_instrument("lead").unwrap();
    let seq = engine.create_sequence(120);
    let track = engine.add_track(seq, lead).unwrap();
    engine.add_note(seq, track, 60, 100, 0.0, 1.0).unwrap();
    engine.unload_instrument(lead).unwrap();

    engine.start_playback(seq).unwrap();
    assert!(engine.sequencer().is_playing());
    engine.stop_playback();
}

#[test]
fn test_drop_releases_playing_notes() {
    let (engine, _output) = test_engine();
    let registry = engine.instruments().clone();
    let seq = engine.create_sequence(120);
    let track = engine.add_track(seq, 0).unwrap();
    engine.add_note(seq, track, 60, 100, 0.0, 1.0).unwrap();
    engine.start_playback(seq).unwrap();
    assert_eq!(registry.active_notes(0), Some(vec![60]));

    drop(engine);
    assert_eq!(registry.active_notes(0), Some(vec![]));
}
