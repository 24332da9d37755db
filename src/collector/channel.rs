//! Channel-backed event source.
//!
//! Producers on any thread send [`InputEvent`]s into a bounded channel; a pump
//! thread forwards them to the attached sink. This is how a host with its own
//! event thread (an OS hook, a stdin reader) feeds the engine.

use crate::collector::source::{CollectorError, InputSink, InputSource};
use crate::collector::types::InputEvent;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Event source fed through a bounded crossbeam channel.
pub struct ChannelSource {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    shutdown: Option<Sender<()>>,
    pump: Option<JoinHandle<()>>,
}

impl ChannelSource {
    /// Create a source with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a source whose channel holds at most `capacity` pending events.
    pub fn with_capacity(capacity: usize) -> Self {
        // Bounded so a stalled engine cannot grow memory without limit
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            shutdown: None,
            pump: None,
        }
    }

    /// Get a producer handle. Cheap to clone and safe to move across threads.
    pub fn sender(&self) -> EventSender {
        EventSender {
            inner: self.sender.clone(),
        }
    }
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for ChannelSource {
    fn attach(&mut self, sink: Arc<dyn InputSink>) -> Result<(), CollectorError> {
        if self.pump.is_some() {
            return Err(CollectorError::AlreadyAttached);
        }

        // Events sent while detached are stale
        while self.receiver.try_recv().is_ok() {}

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let receiver = self.receiver.clone();

        let handle = thread::Builder::new()
            .name("empath-input-pump".into())
            .spawn(move || pump_events(receiver, shutdown_rx, sink))
            .map_err(|e| {
                tracing::error!("Failed to spawn input pump: {}", e);
                CollectorError::Disconnected
            })?;

        self.shutdown = Some(shutdown_tx);
        self.pump = Some(handle);
        Ok(())
    }

    fn detach(&mut self) {
        // Dropping the shutdown sender wakes the pump's select
        self.shutdown.take();
        if let Some(handle) = self.pump.take() {
            let _ = handle.join();
        }
    }

    fn is_attached(&self) -> bool {
        self.pump.is_some()
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        self.detach();
    }
}

fn pump_events(receiver: Receiver<InputEvent>, shutdown: Receiver<()>, sink: Arc<dyn InputSink>) {
    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(receiver) -> event => match event {
                Ok(event) => sink.on_event(&event),
                Err(_) => break,
            },
        }
    }
}

/// Producer side of a [`ChannelSource`].
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<InputEvent>,
}

impl EventSender {
    /// Send without blocking. A full channel drops the event and reports it.
    pub fn send(&self, event: InputEvent) -> Result<(), CollectorError> {
        match self.inner.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Input channel full, dropping event");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(CollectorError::Disconnected),
        }
    }

    pub fn pointer_move(&self, delta_x: f64, delta_y: f64) -> Result<(), CollectorError> {
        self.send(InputEvent::pointer_move(delta_x, delta_y))
    }

    pub fn key_down(&self, key: &str) -> Result<(), CollectorError> {
        self.send(InputEvent::key_down(key))
    }
}
