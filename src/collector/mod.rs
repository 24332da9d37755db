//! Event collection for the EmpathAI sensor.
//!
//! Host environments deliver pointer and keyboard events through an
//! [`InputSource`]; the engine registers an owned [`InputSink`] handler with
//! each source while it is running.

pub mod channel;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use channel::{ChannelSource, EventSender};
pub use source::{CollectorError, InputSink, InputSource, ManualSource};
pub use types::{InputEvent, Key, KeySample, PointerSample};
