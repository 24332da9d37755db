//! Emotional-state labels and the snapshot value handed to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven mutually exclusive emotional-state labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Focused,
    Frustrated,
    Happy,
    Bored,
    Curious,
    Stressed,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Focused,
        Emotion::Frustrated,
        Emotion::Happy,
        Emotion::Bored,
        Emotion::Curious,
        Emotion::Stressed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Focused => "focused",
            Emotion::Frustrated => "frustrated",
            Emotion::Happy => "happy",
            Emotion::Bored => "bored",
            Emotion::Curious => "curious",
            Emotion::Stressed => "stressed",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable emotional-state estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    #[serde(rename = "type")]
    pub emotion: Emotion,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl EmotionSnapshot {
    pub fn new(emotion: Emotion, confidence: f64) -> Self {
        Self {
            emotion,
            confidence,
            timestamp: Utc::now(),
        }
    }
}
