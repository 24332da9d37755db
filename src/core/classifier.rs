//! Rule-ordered emotion classifier.
//!
//! Rules are evaluated top to bottom and the first match wins. Ranges overlap
//! between rules, so order is priority. Thresholds are empirical and kept as-is.

use crate::core::emotion::Emotion;
use crate::core::features::SignalFeatures;
use serde::{Deserialize, Serialize};

/// Confidence reported when no rule matches.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// The rule that produced a classification, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Fast, erratic pointer with repeated corrections
    RapidErraticCorrections,
    /// Heavy, error-prone typing while moving fast
    ErrorProneTyping,
    /// Sustained accurate typing with a steady pointer
    SteadyTyping,
    /// Many varied pointer movements, little typing
    Exploring,
    /// Moderate smooth pointer with light accurate typing
    RelaxedFlow,
    /// Almost no input at all
    Idle,
    /// Nothing else matched
    Fallback,
}

impl Rule {
    /// Every rule in evaluation order.
    pub const ORDER: [Rule; 7] = [
        Rule::RapidErraticCorrections,
        Rule::ErrorProneTyping,
        Rule::SteadyTyping,
        Rule::Exploring,
        Rule::RelaxedFlow,
        Rule::Idle,
        Rule::Fallback,
    ];

    pub fn emotion(self) -> Emotion {
        match self {
            Rule::RapidErraticCorrections => Emotion::Frustrated,
            Rule::ErrorProneTyping => Emotion::Stressed,
            Rule::SteadyTyping => Emotion::Focused,
            Rule::Exploring => Emotion::Curious,
            Rule::RelaxedFlow => Emotion::Happy,
            Rule::Idle => Emotion::Bored,
            Rule::Fallback => Emotion::Neutral,
        }
    }

    pub fn confidence(self) -> f64 {
        match self {
            Rule::RapidErraticCorrections => 0.85,
            Rule::ErrorProneTyping => 0.80,
            Rule::SteadyTyping => 0.75,
            Rule::Exploring => 0.70,
            Rule::RelaxedFlow => 0.65,
            Rule::Idle => 0.60,
            Rule::Fallback => NEUTRAL_CONFIDENCE,
        }
    }

    /// Whether this rule's condition holds, ignoring higher-priority rules.
    pub fn matches(self, f: &SignalFeatures) -> bool {
        match self {
            Rule::RapidErraticCorrections => {
                f.avg_pointer_speed > 60.0 && f.correction_count > 2 && f.pointer_variance > 30.0
            }
            Rule::ErrorProneTyping => {
                f.key_count > 20 && f.error_rate > 0.3 && f.avg_pointer_speed > 50.0
            }
            Rule::SteadyTyping => {
                f.key_count > 15 && f.error_rate < 0.1 && f.pointer_variance < 20.0
            }
            Rule::Exploring => {
                f.pointer_sample_count > 10
                    && f.pointer_variance > 20.0
                    && f.pointer_variance < 50.0
                    && f.key_count < 10
            }
            Rule::RelaxedFlow => {
                f.avg_pointer_speed > 20.0
                    && f.avg_pointer_speed < 50.0
                    && f.pointer_variance < 15.0
                    && f.key_count > 5
                    && f.error_rate < 0.15
            }
            Rule::Idle => f.key_count == 0 && f.pointer_sample_count < 3,
            Rule::Fallback => true,
        }
    }
}

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub emotion: Emotion,
    pub confidence: f64,
    pub rule: Rule,
}

/// Classify a feature vector. Pure: depends on nothing but `features`.
pub fn classify(features: &SignalFeatures) -> Classification {
    let rule = Rule::ORDER
        .into_iter()
        .find(|rule| rule.matches(features))
        .unwrap_or(Rule::Fallback);

    Classification {
        emotion: rule.emotion(),
        confidence: rule.confidence(),
        rule,
    }
}
