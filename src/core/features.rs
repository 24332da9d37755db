//! Feature extraction from the current signal window.
//!
//! All features are pure functions of the buffered samples: the same buffers
//! always produce the same features. Empty buffers degrade to zeros.

use crate::collector::types::{KeySample, PointerSample};
use crate::core::windowing::SignalWindow;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Scalar features consumed by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalFeatures {
    /// Mean pointer speed, 0 with no samples
    pub avg_pointer_speed: f64,
    /// Population standard deviation of pointer speed, 0 with fewer than 2 samples
    pub pointer_variance: f64,
    pub pointer_sample_count: usize,
    pub key_count: usize,
    /// Backspace/Delete presses
    pub correction_count: usize,
    /// corrections / keys, 0 with no keys
    pub error_rate: f64,
}

/// Compute features from an already-evicted window.
pub fn extract_features(window: &SignalWindow) -> SignalFeatures {
    compute_features(window.pointer_samples(), window.key_samples())
}

/// Compute features from raw sample slices.
pub fn compute_features(pointer: &[PointerSample], keys: &[KeySample]) -> SignalFeatures {
    let speeds: Vec<f64> = pointer.iter().map(|s| s.speed).collect();

    let avg_pointer_speed = if speeds.is_empty() {
        0.0
    } else {
        speeds.iter().mean()
    };

    // Spread of a single point is undefined; treat it as no spread
    let pointer_variance = if speeds.len() < 2 {
        0.0
    } else {
        speeds.iter().population_std_dev()
    };

    let key_count = keys.len();
    let correction_count = keys.iter().filter(|k| k.key.is_correction()).count();
    let error_rate = if key_count == 0 {
        0.0
    } else {
        correction_count as f64 / key_count as f64
    };

    SignalFeatures {
        avg_pointer_speed,
        pointer_variance,
        pointer_sample_count: speeds.len(),
        key_count,
        correction_count,
        error_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::Key;
    use pretty_assertions::assert_eq;
    use std::time::Instant;

    fn pointer(speeds: &[f64]) -> Vec<PointerSample> {
        let now = Instant::now();
        speeds
            .iter()
            .map(|&speed| PointerSample {
                speed,
                timestamp: now,
            })
            .collect()
    }

    fn keys(keys: &[Key]) -> Vec<KeySample> {
        let now = Instant::now();
        keys.iter().map(|&k| KeySample::new(k, now)).collect()
    }

    #[test]
    fn test_empty_buffers_are_all_zero() {
        assert_eq!(compute_features(&[], &[]), SignalFeatures::default());
    }

    #[test]
    fn test_single_sample_has_no_variance() {
        let features = compute_features(&pointer(&[42.0]), &[]);
        assert_eq!(features.avg_pointer_speed, 42.0);
        assert_eq!(features.pointer_variance, 0.0);
        assert_eq!(features.pointer_sample_count, 1);
    }

    #[test]
    fn test_population_std_dev() {
        let features = compute_features(&pointer(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), &[]);
        assert!((features.avg_pointer_speed - 5.0).abs() < 1e-9);
        assert!((features.pointer_variance - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_rate() {
        let features = compute_features(
            &[],
            &keys(&[Key::Character, Key::Backspace, Key::Character, Key::Delete]),
        );
        assert_eq!(features.key_count, 4);
        assert_eq!(features.correction_count, 2);
        assert_eq!(features.error_rate, 0.5);
    }

    #[test]
    fn test_extraction_is_reproducible() {
        let p = pointer(&[10.0, 80.0, 35.5]);
        let k = keys(&[Key::Enter, Key::Backspace]);
        assert_eq!(compute_features(&p, &k), compute_features(&p, &k));
    }
}
