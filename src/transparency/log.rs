//! Privacy-preserving transparency log.
//!
//! Cumulative counters describing what the engine has observed and emitted.
//! Only counts are kept; no sample content is retained and nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency counters for one engine instance.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Pointer events turned into samples
    pointer_events: AtomicU64,
    /// Pointer events dropped by the throttle
    pointer_events_throttled: AtomicU64,
    /// Key events turned into samples
    key_events: AtomicU64,
    /// Key events that were corrections
    correction_events: AtomicU64,
    /// Analysis ticks run
    analysis_ticks: AtomicU64,
    /// Snapshots emitted to observers
    emissions: AtomicU64,
    /// Observer callbacks that panicked
    observer_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            pointer_events: AtomicU64::new(0),
            pointer_events_throttled: AtomicU64::new(0),
            key_events: AtomicU64::new(0),
            correction_events: AtomicU64::new(0),
            analysis_ticks: AtomicU64::new(0),
            emissions: AtomicU64::new(0),
            observer_failures: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record a pointer event, accepted or throttled.
    pub fn record_pointer_event(&self, accepted: bool) {
        if accepted {
            self.pointer_events.fetch_add(1, Ordering::Relaxed);
        } else {
            self.pointer_events_throttled.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a key event.
    pub fn record_key_event(&self, is_correction: bool) {
        self.key_events.fetch_add(1, Ordering::Relaxed);
        if is_correction {
            self.correction_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_analysis_tick(&self) {
        self.analysis_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emission(&self) {
        self.emissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_observer_failure(&self) {
        self.observer_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            pointer_events: self.pointer_events.load(Ordering::Relaxed),
            pointer_events_throttled: self.pointer_events_throttled.load(Ordering::Relaxed),
            key_events: self.key_events.load(Ordering::Relaxed),
            correction_events: self.correction_events.load(Ordering::Relaxed),
            analysis_ticks: self.analysis_ticks.load(Ordering::Relaxed),
            emissions: self.emissions.load(Ordering::Relaxed),
            observer_failures: self.observer_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Pointer events sampled: {}\n\
             - Pointer events throttled: {}\n\
             - Key events sampled: {} ({} corrections)\n\
             - Analysis ticks: {}\n\
             - Emotion changes emitted: {}\n\
             - Observer failures: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No typed characters captured\n\
             - No cursor coordinates captured\n\
             - Samples discarded once outside the signal window",
            stats.pointer_events,
            stats.pointer_events_throttled,
            stats.key_events,
            stats.correction_events,
            stats.analysis_ticks,
            stats.emissions,
            stats.observer_failures,
            stats.session_duration_secs
        )
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub pointer_events: u64,
    pub pointer_events_throttled: u64,
    pub key_events: u64,
    pub correction_events: u64,
    pub analysis_ticks: u64,
    pub emissions: u64,
    pub observer_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record_key_event(false);
        log.record_key_event(true);
        log.record_pointer_event(true);
        log.record_pointer_event(false);
        log.record_pointer_event(false);

        let stats = log.stats();
        assert_eq!(stats.key_events, 2);
        assert_eq!(stats.correction_events, 1);
        assert_eq!(stats.pointer_events, 1);
        assert_eq!(stats.pointer_events_throttled, 2);
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Pointer events"));
        assert!(summary.contains("Key events"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("No typed characters captured"));
    }
}
