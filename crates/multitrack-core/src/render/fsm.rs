//! Render engine lifecycle state machine.

/// Lifecycle of the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Init,
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Event is a no-op in the current state.
    None,
    StateChanged(EngineState),
    /// Event is not allowed before `Init`.
    Rejected,
}

impl EngineState {
    /// Where `event` leads from this state. Pure; the caller commits the
    /// new state once its side effects succeed.
    pub fn transition(self, event: EngineEvent) -> TransitionResult {
        use EngineState::*;

        match (self, event) {
            (Uninitialized, EngineEvent::Init) => TransitionResult::StateChanged(Initialized),
            (_, EngineEvent::Init) => TransitionResult::None,

            (Initialized | Stopped, EngineEvent::Start) => TransitionResult::StateChanged(Running),
            (Running, EngineEvent::Start) => TransitionResult::None,

            (Running, EngineEvent::Stop) => TransitionResult::StateChanged(Stopped),
            (Initialized | Stopped, EngineEvent::Stop) => TransitionResult::None,

            (Uninitialized, EngineEvent::Start | EngineEvent::Stop) => TransitionResult::Rejected,
        }
    }

    pub fn is_running(self) -> bool {
        self == EngineState::Running
    }

    pub fn is_initialized(self) -> bool {
        self != EngineState::Uninitialized
    }
}
