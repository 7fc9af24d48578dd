//! Global input vocabulary: modifier flags, key codes, chords and the event
//! stream delivered to the tiling controller.

use crate::models::direction::Direction;
use crate::models::geometry::Point;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

bitflags! {
    /// Modifier keys currently held
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ModifierFlags: u8 {
        const COMMAND = 1 << 0;
        const OPTION = 1 << 1;
        const CONTROL = 1 << 2;
        const SHIFT = 1 << 3;
        const FUNCTION = 1 << 4;
    }
}

impl ModifierFlags {
    /// Parse a modifier name as written in the settings file
    pub fn parse_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "cmd" | "command" => Some(Self::COMMAND),
            "opt" | "option" | "alt" => Some(Self::OPTION),
            "ctrl" | "control" => Some(Self::CONTROL),
            "shift" => Some(Self::SHIFT),
            "fn" | "function" => Some(Self::FUNCTION),
            _ => None,
        }
    }
}

impl fmt::Display for ModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = [
            (Self::CONTROL, "⌃"),
            (Self::OPTION, "⌥"),
            (Self::SHIFT, "⇧"),
            (Self::COMMAND, "⌘"),
            (Self::FUNCTION, "fn"),
        ];
        for (flag, symbol) in symbols {
            if self.contains(flag) {
                f.write_str(symbol)?;
            }
        }
        Ok(())
    }
}

/// macOS virtual key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const ESCAPE: KeyCode = KeyCode(53);
    pub const LEFT_ARROW: KeyCode = KeyCode(123);
    pub const RIGHT_ARROW: KeyCode = KeyCode(124);
    pub const DOWN_ARROW: KeyCode = KeyCode(125);
    pub const UP_ARROW: KeyCode = KeyCode(126);

    pub fn arrow(self) -> Option<ArrowKey> {
        match self {
            Self::LEFT_ARROW => Some(ArrowKey::Left),
            Self::RIGHT_ARROW => Some(ArrowKey::Right),
            Self::DOWN_ARROW => Some(ArrowKey::Down),
            Self::UP_ARROW => Some(ArrowKey::Up),
            _ => None,
        }
    }
}

/// Arrow keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    pub fn direction(self) -> Direction {
        match self {
            ArrowKey::Up => Direction::North,
            ArrowKey::Down => Direction::South,
            ArrowKey::Left => Direction::West,
            ArrowKey::Right => Direction::East,
        }
    }

    /// Unit step in layout space (y grows upwards)
    pub fn unit_vector(self) -> (f64, f64) {
        match self {
            ArrowKey::Up => (0.0, 1.0),
            ArrowKey::Down => (0.0, -1.0),
            ArrowKey::Left => (-1.0, 0.0),
            ArrowKey::Right => (1.0, 0.0),
        }
    }
}

/// Resolve a set of simultaneously held arrows into a direction. One arrow
/// maps to its cardinal direction, two orthogonal arrows to the diagonal
/// between them; anything else is invalid.
pub fn arrows_to_direction(arrows: &BTreeSet<ArrowKey>) -> Option<Direction> {
    let keys: Vec<ArrowKey> = arrows.iter().copied().collect();
    match keys.as_slice() {
        [single] => Some(single.direction()),
        [a, b] => match (a, b) {
            (ArrowKey::Up, ArrowKey::Left) => Some(Direction::NorthWest),
            (ArrowKey::Up, ArrowKey::Right) => Some(Direction::NorthEast),
            (ArrowKey::Down, ArrowKey::Left) => Some(Direction::SouthWest),
            (ArrowKey::Down, ArrowKey::Right) => Some(Direction::SouthEast),
            _ => None,
        },
        _ => None,
    }
}

/// Modifier combination, optionally with one regular key, that activates a mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chord {
    pub modifiers: ModifierFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyCode>,
}

impl Chord {
    pub fn new(modifiers: ModifierFlags) -> Self {
        Self {
            modifiers,
            key: None,
        }
    }

    pub fn with_key(modifiers: ModifierFlags, key: KeyCode) -> Self {
        Self {
            modifiers,
            key: Some(key),
        }
    }

    /// Exact modifier match; the regular key, if any, must be held as well
    pub fn is_satisfied(&self, held: ModifierFlags, keys_down: &BTreeSet<KeyCode>) -> bool {
        if self.modifiers.is_empty() || held != self.modifiers {
            return false;
        }
        match self.key {
            Some(key) => keys_down.contains(&key),
            None => true,
        }
    }

    /// Chords carrying a regular key are more specific than bare modifier chords
    pub fn specificity(&self) -> u32 {
        self.modifiers.bits().count_ones() + u32::from(self.key.is_some()) * 8
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.modifiers)?;
        if let Some(key) = self.key {
            write!(f, "+{}", key.0)?;
        }
        Ok(())
    }
}

/// Raw global input delivered by the event tap, cursor positions in layout space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ModifiersChanged {
        modifiers: ModifierFlags,
        cursor: Point,
    },
    KeyDown {
        key: KeyCode,
        cursor: Point,
    },
    KeyUp {
        key: KeyCode,
    },
    MouseMoved {
        cursor: Point,
    },
}
