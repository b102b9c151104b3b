//! On-screen keyboard key map and key semantics.

use serde::Deserialize;
use thiserror::Error;

/// Pixel size of the keyboard layout texture.
pub const KEYBOARD_WIDTH: f32 = 2048.0;
pub const KEYBOARD_HEIGHT: f32 = 716.0;

/// Size of the layout source the key rectangles are authored in.
const LAYOUT_SOURCE_WIDTH: f32 = 963.266;
const LAYOUT_SOURCE_HEIGHT: f32 = 337.215;

/// A key as the URL bar understands it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Delete,
    Space,
    Enter,
    Left,
    Right,
    Up,
    Down,
    /// Tab, modifiers, caps lock, escape: no effect on text
    Ignored,
    Char(char),
}

impl Key {
    /// Map a layout key name (as found on the key rectangles) to a key.
    pub fn from_name(name: &str) -> Key {
        match name.to_ascii_lowercase().as_str() {
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "space" | "spacebar" | " " => Key::Space,
            "enter" | "return" => Key::Enter,
            "left" => Key::Left,
            "right" => Key::Right,
            "up" => Key::Up,
            "down" => Key::Down,
            "tab" | "shift" | "ctrl" | "control" | "alt" | "caps lock" | "capslock"
            | "esc" | "escape" | "win" | "command" | "meta" => Key::Ignored,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                    _ => Key::Ignored,
                }
            }
        }
    }
}

/// One key's rectangle in layout pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRect {
    pub name: String,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl KeyRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    pub fn key(&self) -> Key {
        Key::from_name(&self.name)
    }
}

/// Key bounds as authored, in layout source units.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyBounds {
    pub key: String,
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Error)]
pub enum KeyMapError {
    #[error("invalid key map json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Unsorted list of key rectangles; lookups return the first match.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    keys: Vec<KeyRect>,
}

impl KeyMap {
    pub fn new(keys: Vec<KeyRect>) -> Self {
        Self { keys }
    }

    /// Scale authored bounds into the layout pixel grid.
    pub fn from_bounds(bounds: impl IntoIterator<Item = KeyBounds>) -> Self {
        let sx = KEYBOARD_WIDTH / LAYOUT_SOURCE_WIDTH;
        let sy = KEYBOARD_HEIGHT / LAYOUT_SOURCE_HEIGHT;
        let keys = bounds
            .into_iter()
            .map(|b| KeyRect {
                name: b.key,
                x1: b.left * sx,
                y1: b.top * sy,
                x2: b.right * sx,
                y2: b.bottom * sy,
            })
            .collect();
        Self { keys }
    }

    pub fn from_json(text: &str) -> Result<Self, KeyMapError> {
        let bounds: Vec<KeyBounds> = serde_json::from_str(text)?;
        Ok(Self::from_bounds(bounds))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key under normalized keyboard coordinates.
    pub fn key_at(&self, x: f32, y: f32) -> Option<&KeyRect> {
        let px = x * KEYBOARD_WIDTH;
        let py = y * KEYBOARD_HEIGHT;
        self.keys.iter().find(|k| k.contains(px, py))
    }
}
