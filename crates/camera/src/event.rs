//! Input events as delivered by the gesture recognizer.

use foundation::Time;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Any function key held; selects the alternate meaning of a gesture.
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Keys the controller reacts to; anything else is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    Minus,
    Equal,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Other(String),
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        match s.as_str() {
            "-" => Key::Minus,
            "=" | "+" => Key::Equal,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            _ => Key::Other(s),
        }
    }
}

impl From<Key> for String {
    fn from(k: Key) -> Self {
        match k {
            Key::Minus => "-".to_string(),
            Key::Equal => "=".to_string(),
            Key::ArrowLeft => "ArrowLeft".to_string(),
            Key::ArrowRight => "ArrowRight".to_string(),
            Key::ArrowUp => "ArrowUp".to_string(),
            Key::ArrowDown => "ArrowDown".to_string(),
            Key::Other(s) => s,
        }
    }
}

/// Discriminant of [`EventKind`], used to key the handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PanStart,
    PanMove,
    PanEnd,
    Wheel,
    DoubleTap,
    KeyDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    PanStart {
        pos: [f64; 2],
        #[serde(default)]
        right_button: bool,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PanMove {
        pos: [f64; 2],
    },
    PanEnd {
        pos: [f64; 2],
        /// Pointer speed in pixels per millisecond; zero when the pointer was still.
        #[serde(default)]
        velocity: f64,
        #[serde(default)]
        velocity_x: f64,
        #[serde(default)]
        velocity_y: f64,
    },
    Wheel {
        pos: [f64; 2],
        /// Normalized wheel delta; positive zooms in.
        delta: f64,
        /// Raw device deltas.
        #[serde(default)]
        delta_x: f64,
        #[serde(default)]
        delta_y: f64,
    },
    DoubleTap {
        pos: [f64; 2],
        #[serde(default)]
        modifiers: Modifiers,
    },
    KeyDown {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub timestamp_ms: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl InputEvent {
    pub fn new(timestamp_ms: f64, kind: EventKind) -> Self {
        Self { timestamp_ms, kind }
    }

    pub fn time(&self) -> Time {
        Time::from_millis(self.timestamp_ms)
    }

    pub fn event_type(&self) -> EventType {
        match self.kind {
            EventKind::PanStart { .. } => EventType::PanStart,
            EventKind::PanMove { .. } => EventType::PanMove,
            EventKind::PanEnd { .. } => EventType::PanEnd,
            EventKind::Wheel { .. } => EventType::Wheel,
            EventKind::DoubleTap { .. } => EventType::DoubleTap,
            EventKind::KeyDown { .. } => EventType::KeyDown,
        }
    }

    /// Pointer position, for pointer events.
    pub fn pos(&self) -> Option<[f64; 2]> {
        match self.kind {
            EventKind::PanStart { pos, .. }
            | EventKind::PanMove { pos }
            | EventKind::PanEnd { pos, .. }
            | EventKind::Wheel { pos, .. }
            | EventKind::DoubleTap { pos, .. } => Some(pos),
            EventKind::KeyDown { .. } => None,
        }
    }

    /// Same event with its pointer position mapped through `f`.
    pub fn map_pos(&self, f: impl Fn([f64; 2]) -> [f64; 2]) -> Self {
        let mut out = self.clone();
        match &mut out.kind {
            EventKind::PanStart { pos, .. }
            | EventKind::PanMove { pos }
            | EventKind::PanEnd { pos, .. }
            | EventKind::Wheel { pos, .. }
            | EventKind::DoubleTap { pos, .. } => *pos = f(*pos),
            EventKind::KeyDown { .. } => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{EventKind, EventType, InputEvent, Key, Modifiers};

    #[test]
    fn parses_tagged_events() {
        let json = r#"[
            {"timestamp_ms": 0, "type": "panstart", "pos": [10, 20], "modifiers": {"shift": true}},
            {"timestamp_ms": 16, "type": "panend", "pos": [12, 20], "velocity": 0.5, "velocity_x": 0.5},
            {"timestamp_ms": 40, "type": "keydown", "key": "ArrowUp"},
            {"timestamp_ms": 50, "type": "keydown", "key": "PageUp"}
        ]"#;
        let events: Vec<InputEvent> = serde_json::from_str(json).expect("parse");
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].event_type(), EventType::PanStart);
        match &events[0].kind {
            EventKind::PanStart {
                modifiers,
                right_button,
                ..
            } => {
                assert!(modifiers.any());
                assert!(!right_button);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &events[1].kind {
            EventKind::PanEnd { velocity_y, .. } => assert_eq!(*velocity_y, 0.0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            events[2].kind,
            EventKind::KeyDown {
                key: Key::ArrowUp,
                modifiers: Modifiers::NONE
            }
        );
        assert!(matches!(&events[3].kind, EventKind::KeyDown { key: Key::Other(k), .. } if k == "PageUp"));
    }

    #[test]
    fn map_pos_translates_pointer_events_only() {
        let wheel = InputEvent::new(
            0.0,
            EventKind::Wheel {
                pos: [15.0, 25.0],
                delta: 1.0,
                delta_x: 0.0,
                delta_y: 0.0,
            },
        );
        let local = wheel.map_pos(|p| [p[0] - 5.0, p[1] - 5.0]);
        assert_eq!(local.pos(), Some([10.0, 20.0]));

        let key = InputEvent::new(
            0.0,
            EventKind::KeyDown {
                key: Key::Minus,
                modifiers: Modifiers::NONE,
            },
        );
        assert_eq!(key.map_pos(|_| [0.0, 0.0]), key);
        assert_eq!(key.pos(), None);
    }
}
