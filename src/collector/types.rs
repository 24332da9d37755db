//! Privacy-preserving sample and event types for the EmpathAI sensor.
//!
//! Pointer samples carry only a movement magnitude, key samples carry only a
//! key category. Cursor coordinates and typed characters never reach the engine.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Category of a pressed key.
///
/// Printable keys collapse into [`Key::Character`]; the character itself is
/// discarded at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    /// Arrows, Home/End, PageUp/PageDown
    Navigation,
    /// Shift, Control, Alt, Meta, CapsLock
    Modifier,
    /// Any single printable character
    Character,
    Other,
}

impl Key {
    /// Map a DOM-style key name (`"Backspace"`, `"a"`, `"ArrowLeft"`) to its category.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Backspace" => Key::Backspace,
            "Delete" | "Del" => Key::Delete,
            "Enter" | "Return" => Key::Enter,
            "Tab" => Key::Tab,
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "ArrowRight" | "ArrowUp" | "ArrowDown" | "Home" | "End" | "PageUp"
            | "PageDown" => Key::Navigation,
            "Shift" | "Control" | "Alt" | "AltGraph" | "Meta" | "CapsLock" | "Fn" => Key::Modifier,
            _ if name.chars().count() == 1 => Key::Character,
            _ => Key::Other,
        }
    }

    /// Whether this key signals error-fixing behavior.
    pub fn is_correction(self) -> bool {
        matches!(self, Key::Backspace | Key::Delete)
    }
}

/// One accepted pointer movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Sum of absolute axis deltas since the previous event
    pub speed: f64,
    pub timestamp: Instant,
}

impl PointerSample {
    /// Build a sample from raw axis deltas. `None` if the speed is not finite.
    pub fn from_deltas(delta_x: f64, delta_y: f64, timestamp: Instant) -> Option<Self> {
        movement_speed(delta_x, delta_y).map(|speed| Self { speed, timestamp })
    }
}

/// Sum of absolute axis deltas, or `None` when it is NaN or infinite.
pub fn movement_speed(delta_x: f64, delta_y: f64) -> Option<f64> {
    let speed = delta_x.abs() + delta_y.abs();
    speed.is_finite().then_some(speed)
}

/// One key-down event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySample {
    pub key: Key,
    pub timestamp: Instant,
}

impl KeySample {
    pub fn new(key: Key, timestamp: Instant) -> Self {
        Self { key, timestamp }
    }
}

/// A raw input event as delivered by a host event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    PointerMove { dx: f64, dy: f64 },
    KeyDown { key: String },
}

impl InputEvent {
    pub fn pointer_move(dx: f64, dy: f64) -> Self {
        InputEvent::PointerMove { dx, dy }
    }

    pub fn key_down(key: impl Into<String>) -> Self {
        InputEvent::KeyDown { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_speed_is_manhattan() {
        let sample = PointerSample::from_deltas(-3.0, 4.0, Instant::now()).unwrap();
        assert!((sample.speed - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overflowing_speed_is_rejected() {
        // Each delta is finite but their sum is not
        assert_eq!(movement_speed(f64::MAX, f64::MAX), None);
        assert_eq!(movement_speed(f64::NAN, 1.0), None);
        assert_eq!(movement_speed(1.0, f64::NEG_INFINITY), None);
        assert!(PointerSample::from_deltas(f64::MAX, -f64::MAX, Instant::now()).is_none());
    }

    #[test]
    fn test_key_categories() {
        assert_eq!(Key::from_name("Backspace"), Key::Backspace);
        assert_eq!(Key::from_name("Delete"), Key::Delete);
        assert_eq!(Key::from_name("a"), Key::Character);
        assert_eq!(Key::from_name("é"), Key::Character);
        assert_eq!(Key::from_name("ArrowLeft"), Key::Navigation);
        assert_eq!(Key::from_name("Shift"), Key::Modifier);
        assert_eq!(Key::from_name("F5"), Key::Other);
    }

    #[test]
    fn test_corrections() {
        assert!(Key::Backspace.is_correction());
        assert!(Key::Delete.is_correction());
        assert!(!Key::Character.is_correction());
        assert!(!Key::Enter.is_correction());
    }

    #[test]
    fn test_input_event_json() {
        let event: InputEvent =
            serde_json::from_str(r#"{"event":"pointer_move","dx":3.0,"dy":-2.5}"#).unwrap();
        assert_eq!(event, InputEvent::pointer_move(3.0, -2.5));

        let event: InputEvent =
            serde_json::from_str(r#"{"event":"key_down","key":"Backspace"}"#).unwrap();
        assert_eq!(event, InputEvent::key_down("Backspace"));
    }
}
