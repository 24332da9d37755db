//! Fixed-cadence analysis timer.

use crossbeam_channel::{bounded, select, tick, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background thread invoking a callback once per interval until stopped.
pub(crate) struct Ticker {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub(crate) fn spawn<F>(interval: Duration, mut on_tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("empath-analysis".into())
            .spawn(move || {
                let ticks = tick(interval);
                loop {
                    select! {
                        recv(shutdown_rx) -> _ => break,
                        recv(ticks) -> _ => on_tick(),
                    }
                }
            })?;

        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Stop the timer. When called from another thread, returns only after the
    /// timer thread has exited, so no callback runs afterwards.
    pub(crate) fn stop(&mut self) {
        // Dropping the sender disconnects the shutdown channel
        self.shutdown.take();

        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Stopped from inside a callback: the loop exits once it returns
                return;
            }
            if handle.join().is_err() {
                tracing::error!("Analysis thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
