//! EmpathAI Sensor - Privacy-first behavioral emotion inference.
//!
//! This library infers a user's likely affective state from pointer movement
//! and keystroke behavior, without cameras, microphones or biometric sensors.
//!
//! # Privacy Guarantees
//!
//! - **No key content**: Only key categories (character, backspace, ...) reach the engine
//! - **No coordinates**: Only pointer movement magnitude is recorded
//! - **No raw storage**: Samples are discarded once they leave the signal window
//! - **Transparency**: Everything sampled and emitted is counted and inspectable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      EmpathAI Sensor                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ InputSource │──▶│   Signal    │──▶│  Features   │       │
//! │  │   (host)    │   │  Window(3s) │   │ (every 1s)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Observers  │◀──│  Emission   │◀──│ Classifier  │       │
//! │  │             │   │ (on change) │   │  (7 rules)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use empath_sensor::{EmotionEngine, EngineConfig, ManualSource};
//!
//! let source = ManualSource::new();
//! let engine = EmotionEngine::builder(EngineConfig::default())
//!     .source(source.clone())
//!     .build()
//!     .expect("valid configuration");
//!
//! let subscription = engine.subscribe(|snapshot| {
//!     println!("{} ({:.2})", snapshot.emotion, snapshot.confidence);
//! });
//! engine.start().expect("Failed to start engine");
//!
//! // The host forwards its input events
//! source.pointer_move(12.0, -3.0);
//! source.key_down("Backspace");
//!
//! subscription.unsubscribe();
//! engine.stop();
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod engine;
pub mod replay;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use collector::{
    ChannelSource, CollectorError, EventSender, InputEvent, InputSink, InputSource, Key,
    ManualSource,
};
pub use config::{ConfigError, EngineConfig, SourceConfig};
pub use crate::core::{classify, Classification, Emotion, EmotionSnapshot, Rule, SignalFeatures};
pub use engine::{EmotionEngine, EngineBuilder, EngineError, EngineMetrics, Subscription};
pub use transparency::{TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║             EMPATHAI SENSOR - PRIVACY DECLARATION                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This engine estimates emotional state from input behavior.      ║
║                                                                  ║
║  ✓ WHAT WE LOOK AT:                                              ║
║    • How fast the pointer moves (speed only)                     ║
║    • How often keys are pressed                                  ║
║    • How often corrections (backspace/delete) are made           ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Which characters you type (no passwords, messages, etc.)    ║
║    • Where your cursor is (no screen position tracking)          ║
║    • Camera, microphone or biometric data                        ║
║    • Any screen content                                          ║
║                                                                  ║
║  All analysis runs locally. Samples are discarded after the      ║
║  signal window (3 seconds by default) and nothing is stored.     ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER CAPTURE"));
        assert!(PRIVACY_DECLARATION.contains("characters you type"));
    }
}
