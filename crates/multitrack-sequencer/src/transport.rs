//! Play/stop transport state machine.

use crate::SequenceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Idle,
    Playing(SequenceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Start(SequenceId),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    Started {
        sequence: SequenceId,
        previous: Option<SequenceId>,
    },
    Stopped(SequenceId),
}

/// Session-wide transport: at most one sequence plays at a time.
#[derive(Debug, Default)]
pub struct Transport {
    state: TransportState,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn active_sequence(&self) -> Option<SequenceId> {
        match self.state {
            TransportState::Playing(id) => Some(id),
            TransportState::Idle => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active_sequence().is_some()
    }

    pub fn is_playing_sequence(&self, id: SequenceId) -> bool {
        self.state == TransportState::Playing(id)
    }

    pub fn transition(&mut self, event: TransportEvent) -> TransitionResult {
        match (self.state, event) {
            (state, TransportEvent::Start(sequence)) => {
                self.state = TransportState::Playing(sequence);
                let previous = match state {
                    TransportState::Playing(prev) => Some(prev),
                    TransportState::Idle => None,
                };
                TransitionResult::Started { sequence, previous }
            }
            (TransportState::Playing(id), TransportEvent::Stop) => {
                self.state = TransportState::Idle;
                TransitionResult::Stopped(id)
            }
            (TransportState::Idle, TransportEvent::Stop) => TransitionResult::None,
        }
    }
}
