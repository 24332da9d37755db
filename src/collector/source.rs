//! Ingestion interface between host event sources and the engine.
//!
//! A host source never holds closures into the engine. The engine hands each
//! source an owned [`InputSink`] on `start` and takes it back on `stop`.

use crate::collector::types::{InputEvent, Key};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur while wiring an event source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectorError {
    #[error("Source is already attached to a sink")]
    AlreadyAttached,

    #[error("Event channel disconnected")]
    Disconnected,
}

/// Fixed ingestion interface implemented by the engine's handler object.
pub trait InputSink: Send + Sync {
    /// A pointer moved by the given axis deltas.
    fn on_pointer_move(&self, delta_x: f64, delta_y: f64);

    /// A key went down.
    fn on_key_down(&self, key: Key);

    /// Dispatch a raw host event.
    fn on_event(&self, event: &InputEvent) {
        match event {
            InputEvent::PointerMove { dx, dy } => self.on_pointer_move(*dx, *dy),
            InputEvent::KeyDown { key } => self.on_key_down(Key::from_name(key)),
        }
    }
}

/// A host capability that delivers input events to one sink at a time.
pub trait InputSource: Send {
    /// Begin delivering events to `sink`.
    fn attach(&mut self, sink: Arc<dyn InputSink>) -> Result<(), CollectorError>;

    /// Stop delivering events. Once this returns, the previous sink receives nothing more.
    fn detach(&mut self);

    fn is_attached(&self) -> bool;
}

/// In-process source the host pushes events into by hand.
///
/// Clones share the same registration, so the host keeps one clone and gives
/// another to the engine.
#[derive(Clone, Default)]
pub struct ManualSource {
    sink: Arc<Mutex<Option<Arc<dyn InputSink>>>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event. Returns `false` when no sink is attached and the event was dropped.
    pub fn push(&self, event: &InputEvent) -> bool {
        match self.current_sink() {
            Some(sink) => {
                sink.on_event(event);
                true
            }
            None => false,
        }
    }

    pub fn pointer_move(&self, delta_x: f64, delta_y: f64) -> bool {
        self.push(&InputEvent::pointer_move(delta_x, delta_y))
    }

    pub fn key_down(&self, key: &str) -> bool {
        self.push(&InputEvent::key_down(key))
    }

    fn current_sink(&self) -> Option<Arc<dyn InputSink>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InputSource for ManualSource {
    fn attach(&mut self, sink: Arc<dyn InputSink>) -> Result<(), CollectorError> {
        let mut slot = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(CollectorError::AlreadyAttached);
        }
        *slot = Some(sink);
        Ok(())
    }

    fn detach(&mut self) {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_attached(&self) -> bool {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
