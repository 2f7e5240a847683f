//! Render engine: lifecycle, double-buffered output and the device callback.

mod convert;
mod engine;
mod fsm;

pub use convert::{encode_i16, I16_FULL_SCALE};
pub use engine::{RenderCallback, RenderEngine, RenderHandle};
pub use fsm::{EngineEvent, EngineState, TransitionResult};
