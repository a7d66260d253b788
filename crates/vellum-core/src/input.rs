//! Decoded input events.
//!
//! Hosts translate their native events into [`UiEvent`]s with positions
//! already in UI space. Keys travel as [`KeyCombo`]s whose normalized string
//! form (`"CTRL_SHIFT_Z"`, `"LEFT_ARROW"`) is what key tables are written in.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Press,
    Drag,
    Release,
    Move,
    Enter,
    Leave,
    Wheel,
    KeyPress,
    TextInput,
    FocusGained,
    FocusLost,
    ValueChanged,
}

impl EventType {
    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            EventType::Click
                | EventType::Press
                | EventType::Drag
                | EventType::Release
                | EventType::Move
                | EventType::Enter
                | EventType::Leave
                | EventType::Wheel
        )
    }
}

/// Pointer affordance a component asks the host to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CursorType {
    #[default]
    Default,
    Text,
    Hand,
    Crosshair,
    Move,
    Wait,
    Eyedropper,
    ScrollX,
    ScrollY,
    ZoomIn,
    ZoomOut,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL = 0b001;
        const SHIFT = 0b010;
        const ALT = 0b100;
    }
}

/// A key plus held modifiers, e.g. `CTRL_SHIFT_Z`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: Modifiers,
    /// Upper-case host key name such as `A`, `LEFT_ARROW`, `BACK_SPACE`.
    pub key: String,
}

impl KeyCombo {
    pub fn new(modifiers: Modifiers, key: impl Into<String>) -> Self {
        Self {
            modifiers,
            key: key.into().to_ascii_uppercase(),
        }
    }

    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(Modifiers::empty(), key)
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl() {
            f.write_str("CTRL_")?;
        }
        if self.shift() {
            f.write_str("SHIFT_")?;
        }
        if self.alt() {
            f.write_str("ALT_")?;
        }
        f.write_str(&self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = std::convert::Infallible;

    /// Strips leading `CTRL_`/`SHIFT_`/`ALT_` prefixes in any order; the rest
    /// is the key name. Never fails: unknown text is taken as a key name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim().to_ascii_uppercase();
        let mut modifiers = Modifiers::empty();
        loop {
            let (flag, prefix) = if rest.starts_with("CTRL_") {
                (Modifiers::CTRL, "CTRL_")
            } else if rest.starts_with("SHIFT_") {
                (Modifiers::SHIFT, "SHIFT_")
            } else if rest.starts_with("ALT_") {
                (Modifiers::ALT, "ALT_")
            } else {
                break;
            };
            if rest.len() == prefix.len() {
                break;
            }
            modifiers |= flag;
            rest = rest[prefix.len()..].to_string();
        }
        Ok(KeyCombo {
            modifiers,
            key: rest,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum EventPayload {
    #[default]
    None,
    /// Wheel notches; positive means "down".
    Wheel(f32),
    Key(KeyCombo),
    Text(String),
    Value(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct UiEvent {
    pub event_type: EventType,
    pub position: Vec2,
    pub payload: EventPayload,
}

impl UiEvent {
    pub fn new(event_type: EventType, position: Vec2) -> Self {
        Self {
            event_type,
            position,
            payload: EventPayload::None,
        }
    }

    pub fn pointer(event_type: EventType, x: f32, y: f32) -> Self {
        Self::new(event_type, Vec2::new(x, y))
    }

    pub fn wheel(x: f32, y: f32, delta: f32) -> Self {
        Self {
            event_type: EventType::Wheel,
            position: Vec2::new(x, y),
            payload: EventPayload::Wheel(delta),
        }
    }

    pub fn key(combo: KeyCombo) -> Self {
        Self {
            event_type: EventType::KeyPress,
            position: Vec2::ZERO,
            payload: EventPayload::Key(combo),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            event_type: EventType::TextInput,
            position: Vec2::ZERO,
            payload: EventPayload::Text(text.into()),
        }
    }

    pub fn value_changed(value: impl Into<String>) -> Self {
        Self {
            event_type: EventType::ValueChanged,
            position: Vec2::ZERO,
            payload: EventPayload::Value(value.into()),
        }
    }

    /// Same event retargeted at another type (e.g. `Release` → `Click`).
    pub fn with_type(&self, event_type: EventType) -> Self {
        Self {
            event_type,
            ..self.clone()
        }
    }

    /// Same event with its position shifted into another coordinate space.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            position: Vec2::new(self.position.x + dx, self.position.y + dy),
            ..self.clone()
        }
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn wheel_delta(&self) -> f32 {
        match self.payload {
            EventPayload::Wheel(d) => d,
            _ => 0.0,
        }
    }

    pub fn key_combo(&self) -> Option<&KeyCombo> {
        match &self.payload {
            EventPayload::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn text_payload(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Text(t) | EventPayload::Value(t) => Some(t.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_display_order() {
        let k = KeyCombo::new(Modifiers::SHIFT | Modifiers::CTRL, "z");
        assert_eq!(k.to_string(), "CTRL_SHIFT_Z");
        assert_eq!(KeyCombo::plain("left_arrow").to_string(), "LEFT_ARROW");
    }

    #[test]
    fn test_combo_parse_keeps_underscored_key_names() {
        let k: KeyCombo = "CTRL_SHIFT_LEFT_ARROW".parse().unwrap();
        assert_eq!(k.modifiers, Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(k.key, "LEFT_ARROW");

        let k: KeyCombo = "shift_ctrl_home".parse().unwrap();
        assert_eq!(k.to_string(), "CTRL_SHIFT_HOME");

        let k: KeyCombo = "BACK_SPACE".parse().unwrap();
        assert!(k.modifiers.is_empty());
        assert_eq!(k.key, "BACK_SPACE");
    }

    #[test]
    fn test_offset_and_retype() {
        let e = UiEvent::pointer(EventType::Release, 10.0, 20.0);
        let c = e.with_type(EventType::Click).offset(-5.0, 5.0);
        assert_eq!(c.event_type, EventType::Click);
        assert_eq!(c.position, Vec2::new(5.0, 25.0));
    }
}
