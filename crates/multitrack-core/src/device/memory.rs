//! In-memory device for tests and offline rendering.

use super::{AudioDevice, StreamFormat};
use crate::render::RenderCallback;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct MemoryQueue {
    depth: usize,
    queued: VecDeque<Vec<i16>>,
    format: Option<StreamFormat>,
    callback: Option<RenderCallback>,
}

/// Device that keeps queued buffers in memory.
///
/// Clones share the same queue, so a test can keep one clone while the
/// engine owns another. [`pull`](Self::pull) plays the part of the hardware:
/// it consumes the oldest buffer and asks the engine for the next.
#[derive(Clone)]
pub struct MemoryDevice {
    inner: Arc<Mutex<MemoryQueue>>,
}

impl MemoryDevice {
    /// `depth` is the number of buffers the queue accepts before refusing.
    pub fn new(depth: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryQueue {
                depth,
                queued: VecDeque::with_capacity(depth),
                format: None,
                callback: None,
            })),
        }
    }

    /// Remove the oldest queued buffer without triggering a render.
    pub fn pop_buffer(&self) -> Option<Vec<i16>> {
        self.inner.lock().queued.pop_front()
    }

    /// Consume the oldest buffer, then request the next one from the engine.
    pub fn pull(&self) -> Option<Vec<i16>> {
        let (buffer, callback) = {
            let mut queue = self.inner.lock();
            (queue.queued.pop_front(), queue.callback.clone())
        };
        if let Some(callback) = callback {
            callback.tick();
        }
        buffer
    }

    pub fn queued(&self) -> usize {
        self.inner.lock().queued.len()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().callback.is_some()
    }

    pub fn format(&self) -> Option<StreamFormat> {
        self.inner.lock().format
    }
}

impl AudioDevice for MemoryDevice {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn play(&mut self, format: StreamFormat, callback: RenderCallback) -> Result<()> {
        let mut queue = self.inner.lock();
        queue.format = Some(format);
        queue.callback = Some(callback);
        Ok(())
    }

    fn enqueue(&mut self, samples: &[i16]) -> Result<()> {
        let mut queue = self.inner.lock();
        if queue.queued.len() >= queue.depth {
            return Err(Error::QueueFull);
        }
        // The engine rewrites `samples` a couple of periods later; keep our own copy.
        queue.queued.push_back(samples.to_vec());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut queue = self.inner.lock();
        queue.queued.clear();
        queue.callback = None;
        Ok(())
    }
}
