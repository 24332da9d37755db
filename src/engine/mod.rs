//! The emotion inference engine.
//!
//! Ingestion appends samples to the signal window; a fixed-cadence analysis
//! tick evicts stale samples, extracts features, classifies them and emits a
//! snapshot when the settled emotion changes.
//!
//! ```text
//!  InputSource ──▶ EngineSink ──▶ SignalWindow
//!                                     │  (every analysis_interval)
//!                                     ▼
//!             evict ─▶ extract_features ─▶ classify ─▶ emit? ─▶ observers
//! ```

pub mod observers;
mod ticker;

pub use observers::{Observer, ObserverRegistry, Subscription, SubscriptionId};

use crate::collector::source::{CollectorError, InputSink, InputSource};
use crate::collector::types::{movement_speed, Key};
use crate::config::{ConfigError, EngineConfig};
use crate::core::classifier::{classify, NEUTRAL_CONFIDENCE};
use crate::core::emotion::{Emotion, EmotionSnapshot};
use crate::core::features::extract_features;
use crate::core::windowing::SignalWindow;
use crate::transparency::{create_shared_log, SharedTransparencyLog, TransparencyStats};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, ThreadId};
use std::time::Instant;
use thiserror::Error;
use ticker::Ticker;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Input source error: {0}")]
    Collector(#[from] CollectorError),

    #[error("Failed to spawn analysis thread: {0}")]
    Spawn(String),
}

/// Point-in-time view of the engine for external monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub pointer_buffer_size: usize,
    pub key_buffer_size: usize,
    pub observer_count: usize,
    pub is_active: bool,
}

/// Mutable state, owned by exactly one engine.
struct EngineState {
    current_emotion: Emotion,
    current_confidence: f64,
    window: SignalWindow,
    active: bool,
}

type StartHook = Box<dyn Fn() + Send + Sync>;

struct EngineInner {
    config: EngineConfig,
    state: Mutex<EngineState>,
    observers: Arc<ObserverRegistry>,
    on_emotion: Option<Observer>,
    transparency: SharedTransparencyLog,
    /// Serializes analysis cycles, notification included
    analysis: Mutex<()>,
    /// Thread currently running an analysis cycle
    analysis_thread: Mutex<Option<ThreadId>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EngineInner {
    fn record_pointer_movement(&self, delta_x: f64, delta_y: f64, now: Instant) -> bool {
        if !self.config.sources.mouse || movement_speed(delta_x, delta_y).is_none() {
            return false;
        }

        let mut state = lock(&self.state);
        if !state.active {
            return false;
        }
        let accepted = state.window.push_pointer(delta_x, delta_y, now);
        self.transparency.record_pointer_event(accepted);
        accepted
    }

    fn record_key_press(&self, key: Key, now: Instant) -> bool {
        if !self.config.sources.keyboard {
            return false;
        }

        let mut state = lock(&self.state);
        if !state.active {
            return false;
        }
        state.window.push_key(key, now);
        self.transparency.record_key_event(key.is_correction());
        true
    }

    fn in_analysis(&self) -> bool {
        *lock(&self.analysis_thread) == Some(thread::current().id())
    }

    /// Run one analysis cycle. A scheduled tick skips if another cycle is in flight.
    fn run_tick(&self, now: Instant, scheduled: bool) -> Option<EmotionSnapshot> {
        if self.in_analysis() {
            tracing::debug!("Ignoring analysis requested from inside an observer");
            return None;
        }

        let _cycle = if scheduled {
            match self.analysis.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return None,
            }
        } else {
            lock(&self.analysis)
        };

        *lock(&self.analysis_thread) = Some(thread::current().id());
        let emitted = self.analyze(now);
        if let Some(snapshot) = &emitted {
            self.notify(snapshot);
        }
        *lock(&self.analysis_thread) = None;

        emitted
    }

    /// Evict, extract, classify and settle. Returns the snapshot to emit, if any.
    fn analyze(&self, now: Instant) -> Option<EmotionSnapshot> {
        let mut state = lock(&self.state);
        if !state.active || !self.config.sources.any_enabled() {
            return None;
        }

        state.window.evict(now);
        let features = extract_features(&state.window);
        let result = classify(&features);
        self.transparency.record_analysis_tick();

        if self.config.debug {
            tracing::info!(
                "Analysis: {} ({:.2}, rule {:?}) from {:?}",
                result.emotion,
                result.confidence,
                result.rule,
                features
            );
        } else {
            tracing::debug!(
                "Analysis: {} ({:.2}) avg_speed={:.1} variance={:.1} keys={} corrections={}",
                result.emotion,
                result.confidence,
                features.avg_pointer_speed,
                features.pointer_variance,
                features.key_count,
                features.correction_count
            );
        }

        if result.emotion == state.current_emotion
            || result.confidence < self.config.confidence_threshold
        {
            return None;
        }

        state.current_emotion = result.emotion;
        state.current_confidence = result.confidence;
        Some(EmotionSnapshot::new(result.emotion, result.confidence))
    }

    fn notify(&self, snapshot: &EmotionSnapshot) {
        self.transparency.record_emission();
        tracing::info!(
            "Emotion changed to {} (confidence {:.2})",
            snapshot.emotion,
            snapshot.confidence
        );

        let mut failures = self.observers.notify(snapshot);
        if let Some(hook) = &self.on_emotion {
            if observers::call_isolated(hook, snapshot).is_err() {
                tracing::warn!("on_emotion hook panicked while handling {}", snapshot.emotion);
                failures += 1;
            }
        }
        for _ in 0..failures {
            self.transparency.record_observer_failure();
        }
    }

    /// Mark active. Returns `false` if already active.
    fn activate(&self) -> bool {
        let mut state = lock(&self.state);
        if state.active {
            return false;
        }
        state.active = true;
        true
    }

    /// Mark inactive and drop all samples. Returns `false` if already inactive.
    fn deactivate(&self) -> bool {
        let mut state = lock(&self.state);
        if !state.active {
            return false;
        }
        state.active = false;
        state.window.clear();
        true
    }
}

/// Owned ingestion handler registered with input sources while the engine runs.
struct EngineSink {
    inner: Arc<EngineInner>,
}

impl InputSink for EngineSink {
    fn on_pointer_move(&self, delta_x: f64, delta_y: f64) {
        self.inner
            .record_pointer_movement(delta_x, delta_y, Instant::now());
    }

    fn on_key_down(&self, key: Key) {
        self.inner.record_key_press(key, Instant::now());
    }
}

/// Resources held only while running.
#[derive(Default)]
struct Runtime {
    sources: Vec<Box<dyn InputSource>>,
    ticker: Option<Ticker>,
}

fn detach_all(sources: &mut [Box<dyn InputSource>]) {
    for source in sources.iter_mut() {
        source.detach();
    }
}

/// Behavioral emotion inference engine.
///
/// Each instance owns its buffers, settled state and observers; any number of
/// engines can run side by side.
pub struct EmotionEngine {
    inner: Arc<EngineInner>,
    runtime: Mutex<Runtime>,
    on_start: Option<StartHook>,
    /// Whether `start` spawns the analysis timer
    scheduled: bool,
}

impl EmotionEngine {
    /// Create an engine with no attached sources. Feed it through
    /// [`record_pointer_movement`](Self::record_pointer_movement),
    /// [`record_key_press`](Self::record_key_press) or [`sink`](Self::sink).
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        EngineBuilder::new(config).build()
    }

    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Attach sources and begin periodic analysis. Calling it again while
    /// running does nothing.
    pub fn start(&self) -> Result<(), EngineError> {
        {
            let mut runtime = lock(&self.runtime);
            if !self.inner.activate() {
                return Ok(());
            }

            if let Err(e) = self.start_runtime(&mut runtime) {
                self.inner.deactivate();
                return Err(e);
            }
        }

        tracing::info!(
            "Engine started (window {:?}, interval {:?})",
            self.inner.config.signal_window,
            self.inner.config.analysis_interval
        );

        if let Some(hook) = &self.on_start {
            hook();
        }
        Ok(())
    }

    fn start_runtime(&self, runtime: &mut Runtime) -> Result<(), EngineError> {
        // Nothing to observe, so nothing to schedule
        if !self.inner.config.sources.any_enabled() {
            tracing::info!("All input sources disabled; analysis is not scheduled");
            return Ok(());
        }

        let sink: Arc<dyn InputSink> = self.sink();
        for index in 0..runtime.sources.len() {
            if let Err(e) = runtime.sources[index].attach(sink.clone()) {
                // Only undo our own attachments; the source may belong to another engine
                detach_all(&mut runtime.sources[..index]);
                return Err(e.into());
            }
        }

        if !self.scheduled {
            return Ok(());
        }

        let inner = self.inner.clone();
        match Ticker::spawn(self.inner.config.analysis_interval, move || {
            inner.run_tick(Instant::now(), true);
        }) {
            Ok(ticker) => {
                runtime.ticker = Some(ticker);
                Ok(())
            }
            Err(e) => {
                detach_all(&mut runtime.sources);
                Err(EngineError::Spawn(e.to_string()))
            }
        }
    }

    /// Detach sources, cancel the analysis timer and clear both buffers.
    ///
    /// Once this returns no further samples are recorded and no snapshot is
    /// emitted until the next [`start`](Self::start). Calling it again does nothing.
    pub fn stop(&self) {
        let ticker = {
            let mut runtime = lock(&self.runtime);
            if !self.inner.deactivate() {
                return;
            }
            detach_all(&mut runtime.sources);
            runtime.ticker.take()
        };

        // Joined outside the runtime lock: an observer on the timer thread may call stop too
        if let Some(mut ticker) = ticker {
            ticker.stop();
        }

        // Wait out a cycle running on another thread
        if !self.inner.in_analysis() {
            drop(lock(&self.inner.analysis));
        }

        tracing::info!("Engine stopped");
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner.state).active
    }

    /// Record a pointer movement observed at `now`. Returns `true` if a sample was kept.
    pub fn record_pointer_movement(&self, delta_x: f64, delta_y: f64, now: Instant) -> bool {
        self.inner.record_pointer_movement(delta_x, delta_y, now)
    }

    /// Record a key press observed at `now`. Returns `true` if a sample was kept.
    pub fn record_key_press(&self, key: Key, now: Instant) -> bool {
        self.inner.record_key_press(key, now)
    }

    /// Run one analysis cycle at `now`, returning the emitted snapshot, if any.
    ///
    /// Hosts that drive their own clock call this instead of relying on the
    /// internal timer.
    pub fn tick_at(&self, now: Instant) -> Option<EmotionSnapshot> {
        self.inner.run_tick(now, false)
    }

    /// Ingestion handler for hosts that wire event sources themselves.
    pub fn sink(&self) -> Arc<dyn InputSink> {
        Arc::new(EngineSink {
            inner: self.inner.clone(),
        })
    }

    /// Register an observer for emotion changes.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&EmotionSnapshot) + Send + Sync + 'static,
    {
        let id = self.inner.observers.register(Arc::new(observer));
        Subscription::new(id, &self.inner.observers)
    }

    /// Remove an observer. Idempotent.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.inner.observers.remove(subscription.id())
    }

    /// The settled emotion, stamped with the current time.
    pub fn current_snapshot(&self) -> EmotionSnapshot {
        let state = lock(&self.inner.state);
        EmotionSnapshot::new(state.current_emotion, state.current_confidence)
    }

    pub fn metrics(&self) -> EngineMetrics {
        let state = lock(&self.inner.state);
        EngineMetrics {
            pointer_buffer_size: state.window.pointer_samples().len(),
            key_buffer_size: state.window.key_samples().len(),
            observer_count: self.inner.observers.len(),
            is_active: state.active,
        }
    }

    pub fn transparency(&self) -> TransparencyStats {
        self.inner.transparency.stats()
    }

    /// Human-readable transparency summary.
    pub fn transparency_summary(&self) -> String {
        self.inner.transparency.summary()
    }
}

impl Drop for EmotionEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for [`EmotionEngine`].
pub struct EngineBuilder {
    config: EngineConfig,
    sources: Vec<Box<dyn InputSource>>,
    on_start: Option<StartHook>,
    on_emotion: Option<Observer>,
    scheduled: bool,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
            on_start: None,
            on_emotion: None,
            scheduled: true,
        }
    }

    /// Do not spawn the analysis timer; the host drives analysis with
    /// [`EmotionEngine::tick_at`].
    pub fn manual_clock(mut self) -> Self {
        self.scheduled = false;
        self
    }

    /// Add an event source, attached on every start and detached on stop.
    pub fn source(mut self, source: impl InputSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Run `hook` each time the engine actually starts.
    pub fn on_start(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Notify `hook` of every emission, after all subscribers.
    pub fn on_emotion(mut self, hook: impl Fn(&EmotionSnapshot) + Send + Sync + 'static) -> Self {
        self.on_emotion = Some(Arc::new(hook));
        self
    }

    /// Validate the configuration and create the engine.
    pub fn build(self) -> Result<EmotionEngine, EngineError> {
        self.config.validate()?;

        let window = SignalWindow::new(self.config.signal_window, self.config.pointer_throttle);
        let inner = EngineInner {
            config: self.config,
            state: Mutex::new(EngineState {
                current_emotion: Emotion::Neutral,
                current_confidence: NEUTRAL_CONFIDENCE,
                window,
                active: false,
            }),
            observers: Arc::new(ObserverRegistry::new()),
            on_emotion: self.on_emotion,
            transparency: create_shared_log(),
            analysis: Mutex::new(()),
            analysis_thread: Mutex::new(None),
        };

        Ok(EmotionEngine {
            inner: Arc::new(inner),
            runtime: Mutex::new(Runtime {
                sources: self.sources,
                ticker: None,
            }),
            on_start: self.on_start,
            scheduled: self.scheduled,
        })
    }
}
