//! Core functionality for the EmpathAI sensor.
//!
//! This module contains:
//! - The sliding signal window and its eviction
//! - Feature extraction from the window contents
//! - The rule-ordered emotion classifier

pub mod classifier;
pub mod emotion;
pub mod features;
pub mod windowing;

// Re-export commonly used types
pub use classifier::{classify, Classification, Rule, NEUTRAL_CONFIDENCE};
pub use emotion::{Emotion, EmotionSnapshot};
pub use features::{compute_features, extract_features, SignalFeatures};
pub use windowing::SignalWindow;
