//! Commands sent from [`InstrumentRegistry`](super::InstrumentRegistry) to the renderer.

use super::{InstrumentHandle, InstrumentKind};
use crate::InstrumentId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum VoiceCommand {
    Load {
        handle: InstrumentHandle,
        id: InstrumentId,
        kind: InstrumentKind,
        volume: f32,
    },
    Unload {
        handle: InstrumentHandle,
    },
    NoteOn {
        handle: InstrumentHandle,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        handle: InstrumentHandle,
        note: u8,
    },
    SetVolume {
        handle: InstrumentHandle,
        volume: f32,
    },
}

impl VoiceCommand {
    pub(crate) fn handle(&self) -> InstrumentHandle {
        match *self {
            VoiceCommand::Load { handle, .. }
            | VoiceCommand::Unload { handle }
            | VoiceCommand::NoteOn { handle, .. }
            | VoiceCommand::NoteOff { handle, .. }
            | VoiceCommand::SetVolume { handle, .. } => handle,
        }
    }
}
