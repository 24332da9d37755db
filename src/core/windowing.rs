//! Sliding time window over recent input samples.
//!
//! Samples are appended in arrival order and evicted once they fall outside
//! the window. Pointer samples are throttled on the way in so a
//! high-frequency source cannot flood the buffer.

use crate::collector::types::{Key, KeySample, PointerSample};
use std::time::{Duration, Instant};

/// The two sample buffers plus the pointer throttle marker.
#[derive(Debug, Clone)]
pub struct SignalWindow {
    /// Trailing span samples are kept for
    window: Duration,
    /// Minimum spacing between accepted pointer samples
    pointer_throttle: Duration,
    pointer_samples: Vec<PointerSample>,
    key_samples: Vec<KeySample>,
    last_pointer_time: Option<Instant>,
}

impl SignalWindow {
    pub fn new(window: Duration, pointer_throttle: Duration) -> Self {
        Self {
            window,
            pointer_throttle,
            pointer_samples: Vec::new(),
            key_samples: Vec::new(),
            last_pointer_time: None,
        }
    }

    /// Record a pointer movement. Returns `false` if it was throttled or its
    /// speed is not finite.
    pub fn push_pointer(&mut self, delta_x: f64, delta_y: f64, now: Instant) -> bool {
        let Some(sample) = PointerSample::from_deltas(delta_x, delta_y, now) else {
            return false;
        };

        if let Some(last) = self.last_pointer_time {
            // An event stamped before the marker counts as zero elapsed
            if now.saturating_duration_since(last) < self.pointer_throttle {
                return false;
            }
        }

        self.pointer_samples.push(sample);
        self.last_pointer_time = Some(now);
        true
    }

    /// Record a key press. Never throttled: repeated corrections are signal.
    pub fn push_key(&mut self, key: Key, now: Instant) {
        self.key_samples.push(KeySample::new(key, now));
    }

    /// Drop every sample older than the window as of `now`, keeping order.
    pub fn evict(&mut self, now: Instant) {
        let window = self.window;
        let fresh = |ts: Instant| now.saturating_duration_since(ts) <= window;

        self.pointer_samples.retain(|s| fresh(s.timestamp));
        self.key_samples.retain(|s| fresh(s.timestamp));
    }

    /// Empty both buffers and forget the throttle marker.
    pub fn clear(&mut self) {
        self.pointer_samples.clear();
        self.key_samples.clear();
        self.last_pointer_time = None;
    }

    pub fn pointer_samples(&self) -> &[PointerSample] {
        &self.pointer_samples
    }

    pub fn key_samples(&self) -> &[KeySample] {
        &self.key_samples
    }

    pub fn is_empty(&self) -> bool {
        self.pointer_samples.is_empty() && self.key_samples.is_empty()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_throttle_collapses_burst() {
        let mut window = SignalWindow::new(ms(3000), ms(50));
        let t0 = Instant::now();

        // 10 events 4ms apart, all within one throttle interval of the first
        let accepted = (0..10)
            .filter(|i| window.push_pointer(5.0, 5.0, t0 + ms(i * 4)))
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(window.pointer_samples().len(), 1);
    }

    #[test]
    fn test_throttle_measured_from_last_accepted() {
        let mut window = SignalWindow::new(ms(3000), ms(50));
        let t0 = Instant::now();

        assert!(window.push_pointer(1.0, 0.0, t0));
        assert!(!window.push_pointer(1.0, 0.0, t0 + ms(30)));
        // 60ms after the accepted one, even though only 30ms after the dropped one
        assert!(window.push_pointer(1.0, 0.0, t0 + ms(60)));
        assert!(window.push_pointer(1.0, 0.0, t0 + ms(110)));
        assert_eq!(window.pointer_samples().len(), 3);
    }

    #[test]
    fn test_keys_are_never_throttled() {
        let mut window = SignalWindow::new(ms(3000), ms(50));
        let t0 = Instant::now();
        for _ in 0..5 {
            window.push_key(Key::Backspace, t0);
        }
        assert_eq!(window.key_samples().len(), 5);
    }

    #[test]
    fn test_eviction_keeps_boundary_and_order() {
        let mut window = SignalWindow::new(ms(3000), ms(50));
        let t0 = Instant::now();

        window.push_pointer(1.0, 0.0, t0);
        window.push_pointer(2.0, 0.0, t0 + ms(1000));
        window.push_pointer(3.0, 0.0, t0 + ms(2000));
        window.push_key(Key::Character, t0);
        window.push_key(Key::Delete, t0 + ms(500));

        window.evict(t0 + ms(3000));
        let speeds: Vec<f64> = window.pointer_samples().iter().map(|s| s.speed).collect();
        assert_eq!(speeds, vec![1.0, 2.0, 3.0]);
        assert_eq!(window.key_samples().len(), 2);

        window.evict(t0 + ms(3001));
        let speeds: Vec<f64> = window.pointer_samples().iter().map(|s| s.speed).collect();
        assert_eq!(speeds, vec![2.0, 3.0]);
        assert_eq!(window.key_samples()[0].key, Key::Delete);
    }

    #[test]
    fn test_eviction_invariant_holds_after_tick() {
        let mut window = SignalWindow::new(ms(3000), ms(50));
        let t0 = Instant::now();
        for i in 0..100 {
            window.push_pointer(1.0, 1.0, t0 + ms(i * 60));
            window.push_key(Key::Character, t0 + ms(i * 60));
        }

        let now = t0 + ms(6000);
        window.evict(now);
        assert!(window
            .pointer_samples()
            .iter()
            .all(|s| now - s.timestamp <= window.window()));
        assert!(window
            .key_samples()
            .iter()
            .all(|s| now - s.timestamp <= window.window()));
    }

    #[test]
    fn test_non_finite_speed_does_not_move_throttle() {
        let mut window = SignalWindow::new(ms(3000), ms(50));
        let t0 = Instant::now();

        assert!(!window.push_pointer(f64::MAX, f64::MAX, t0));
        assert!(window.pointer_samples().is_empty());
        assert!(window.push_pointer(1.0, 0.0, t0 + ms(1)));
    }

    #[test]
    fn test_clear_resets_throttle() {
        let mut window = SignalWindow::new(ms(3000), ms(50));
        let t0 = Instant::now();
        window.push_pointer(1.0, 0.0, t0);
        window.clear();
        assert!(window.is_empty());
        assert!(window.push_pointer(1.0, 0.0, t0 + ms(1)));
    }
}
