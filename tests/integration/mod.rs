//! Integration test modules for multitrack

pub mod bridge;
pub mod instruments;
pub mod playback;
pub mod rendering;
