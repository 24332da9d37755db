//! Transparency module for the EmpathAI sensor.
//!
//! Tracks what the engine collects and emits, so a host can show users
//! exactly how much behavioral data has been looked at.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, SharedTransparencyLog, TransparencyLog, TransparencyStats};
