//! Replay of recorded input traces on a virtual clock.
//!
//! A trace is JSON Lines, one event per line, each stamped with its offset
//! from the start of the recording:
//!
//! ```text
//! {"offset_ms": 0,   "event": "pointer_move", "dx": 12.0, "dy": -4.0}
//! {"offset_ms": 140, "event": "key_down", "key": "Backspace"}
//! ```
//!
//! Analysis ticks are placed every `analysis_interval` from the start of the
//! trace, so a replay produces the same emissions every time.

use crate::collector::types::{InputEvent, Key};
use crate::core::emotion::EmotionSnapshot;
use crate::engine::EmotionEngine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub offset_ms: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

/// Errors while reading or replaying a trace.
#[derive(Debug, Clone, Error)]
pub enum ReplayError {
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Line {line}: offset {offset_ms}ms is earlier than the previous event")]
    OutOfOrder { line: usize, offset_ms: u64 },

    #[error("Offset {offset_ms}ms is too far from the start of the trace")]
    OffsetOutOfRange { offset_ms: u64 },
}

/// An emission observed during replay, with its virtual time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEmission {
    pub offset_ms: u64,
    #[serde(flatten)]
    pub snapshot: EmotionSnapshot,
}

/// Parse a JSON Lines trace. Blank lines and `#` comments are skipped.
pub fn parse_trace(input: &str) -> Result<Vec<TraceEvent>, ReplayError> {
    let mut events: Vec<TraceEvent> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: TraceEvent = serde_json::from_str(line).map_err(|e| ReplayError::Parse {
            line: index + 1,
            message: e.to_string(),
        })?;

        if let Some(previous) = events.last() {
            if event.offset_ms < previous.offset_ms {
                return Err(ReplayError::OutOfOrder {
                    line: index + 1,
                    offset_ms: event.offset_ms,
                });
            }
        }
        events.push(event);
    }

    Ok(events)
}

/// Feed `events` through a started engine on a virtual clock anchored at `origin`.
///
/// Ticks run at every multiple of the analysis interval up to one interval
/// past the last event. Events stamped at a tick's instant are recorded
/// before that tick runs. Once a tick leaves the window empty, the idle
/// ticks up to the next event are skipped: they could only repeat the
/// classification of an empty window.
pub fn replay(
    engine: &EmotionEngine,
    events: &[TraceEvent],
    origin: Instant,
) -> Result<Vec<ReplayEmission>, ReplayError> {
    let interval_ms = u64::try_from(engine.config().analysis_interval.as_millis())
        .unwrap_or(u64::MAX)
        .max(1);
    let last_offset = events.last().map(|e| e.offset_ms).unwrap_or(0);
    let out_of_range = ReplayError::OffsetOutOfRange {
        offset_ms: last_offset,
    };

    let end_ms = (last_offset / interval_ms + 1)
        .checked_mul(interval_ms)
        .ok_or_else(|| out_of_range.clone())?;
    // Every offset and tick is at most end_ms, so this bounds all instants below
    origin
        .checked_add(Duration::from_millis(end_ms))
        .ok_or(out_of_range)?;
    let at = |offset_ms: u64| origin + Duration::from_millis(offset_ms);

    let mut emissions = Vec::new();
    let mut pending = events.iter().peekable();
    let mut tick_ms = interval_ms;

    while tick_ms <= end_ms {
        while let Some(event) = pending.next_if(|e| e.offset_ms <= tick_ms) {
            record(engine, &event.event, at(event.offset_ms));
        }

        if let Some(snapshot) = engine.tick_at(at(tick_ms)) {
            tracing::debug!("Replay emission at {}ms: {}", tick_ms, snapshot.emotion);
            emissions.push(ReplayEmission {
                offset_ms: tick_ms,
                snapshot,
            });
        }

        let Some(mut next_ms) = tick_ms.checked_add(interval_ms) else {
            break;
        };
        let metrics = engine.metrics();
        if metrics.pointer_buffer_size == 0 && metrics.key_buffer_size == 0 {
            match pending.peek() {
                Some(event) => {
                    next_ms = next_ms.max(first_tick_at_or_after(event.offset_ms, interval_ms));
                }
                None => break,
            }
        }
        tick_ms = next_ms;
    }

    Ok(emissions)
}

/// Smallest multiple of `interval_ms` that is `>= offset_ms`.
fn first_tick_at_or_after(offset_ms: u64, interval_ms: u64) -> u64 {
    let ticks = offset_ms / interval_ms + u64::from(offset_ms % interval_ms != 0);
    ticks.saturating_mul(interval_ms)
}

fn record(engine: &EmotionEngine, event: &InputEvent, at: Instant) {
    match event {
        InputEvent::PointerMove { dx, dy } => {
            engine.record_pointer_movement(*dx, *dy, at);
        }
        InputEvent::KeyDown { key } => {
            engine.record_key_press(Key::from_name(key), at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::emotion::Emotion;

    fn manual_engine() -> EmotionEngine {
        let engine = EmotionEngine::builder(EngineConfig::default())
            .manual_clock()
            .build()
            .unwrap();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn test_parse_trace() {
        let trace = r#"
# frustrated burst
{"offset_ms": 0, "event": "pointer_move", "dx": 30.0, "dy": 0.0}

{"offset_ms": 60, "event": "key_down", "key": "Backspace"}
"#;
        let events = parse_trace(trace).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, InputEvent::pointer_move(30.0, 0.0));
        assert_eq!(events[1].offset_ms, 60);
    }

    #[test]
    fn test_parse_reports_line() {
        let trace = "{\"offset_ms\": 0, \"event\": \"key_down\", \"key\": \"a\"}\nnot json\n";
        match parse_trace(trace) {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_out_of_order() {
        let trace = "{\"offset_ms\": 100, \"event\": \"key_down\", \"key\": \"a\"}\n\
                     {\"offset_ms\": 50, \"event\": \"key_down\", \"key\": \"b\"}";
        assert!(matches!(
            parse_trace(trace),
            Err(ReplayError::OutOfOrder { line: 2, offset_ms: 50 })
        ));
    }

    #[test]
    fn test_replay_typing_burst() {
        let mut lines = Vec::new();
        for i in 0..20 {
            lines.push(format!(
                "{{\"offset_ms\": {}, \"event\": \"key_down\", \"key\": \"a\"}}",
                i * 40
            ));
        }
        let events = parse_trace(&lines.join("\n")).unwrap();

        let engine = manual_engine();
        let emissions = replay(&engine, &events, Instant::now()).unwrap();

        assert_eq!(emissions.len(), 1);
        assert_eq!(emissions[0].offset_ms, 1000);
        assert_eq!(emissions[0].snapshot.emotion, Emotion::Focused);
    }

    #[test]
    fn test_replay_empty_trace_ticks_once() {
        let engine = manual_engine();
        let emissions = replay(&engine, &[], Instant::now()).unwrap();
        assert_eq!(emissions.len(), 1);
        assert_eq!(emissions[0].snapshot.emotion, Emotion::Bored);
    }

    fn key_at(offset_ms: u64, key: &str) -> TraceEvent {
        TraceEvent {
            offset_ms,
            event: InputEvent::key_down(key),
        }
    }

    #[test]
    fn test_replay_rejects_offset_past_clock_range() {
        let engine = manual_engine();
        let events = parse_trace(
            r#"{"offset_ms": 18446744073709551615, "event": "key_down", "key": "a"}"#,
        )
        .unwrap();

        assert!(matches!(
            replay(&engine, &events, Instant::now()),
            Err(ReplayError::OffsetOutOfRange {
                offset_ms: u64::MAX
            })
        ));
        assert_eq!(engine.transparency().analysis_ticks, 0);
    }

    #[test]
    fn test_replay_skips_idle_stretch() {
        let mut events: Vec<TraceEvent> = (0..20).map(|i| key_at(i * 40, "a")).collect();
        events.push(key_at(1_000_000_000_000_000, "a"));

        let engine = manual_engine();
        let emissions = replay(&engine, &events, Instant::now()).unwrap();

        let seen: Vec<(u64, Emotion)> = emissions
            .iter()
            .map(|e| (e.offset_ms, e.snapshot.emotion))
            .collect();
        assert_eq!(
            seen,
            vec![
                (1000, Emotion::Focused),
                // Last typed key at 760ms leaves the window before the 4s tick
                (4000, Emotion::Bored),
                (1_000_000_000_000_000, Emotion::Neutral),
            ]
        );
        assert!(engine.transparency().analysis_ticks < 10);
    }

    #[test]
    fn test_replay_keeps_ticks_while_window_holds_samples() {
        let events = vec![key_at(0, "a"), key_at(5500, "b")];
        let engine = manual_engine();
        replay(&engine, &events, Instant::now()).unwrap();

        // 1s..3s hold the first key, 4s drains it, then straight to 6s
        assert_eq!(engine.transparency().analysis_ticks, 5);
    }
}
