//! Editable address bar text driven by the on-screen keyboard.

use crate::keyboard::Key;

/// Pixel size of the address bar texture.
pub const URL_BAR_WIDTH: f32 = 4096.0;
pub const URL_BAR_HEIGHT: f32 = 256.0;

/// Left inset of the text inside the bar, in bar pixels.
const TEXT_INSET: f32 = 10.0;

const INITIAL_TEXT: &str = "http://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlBarAction {
    /// Text or cursor changed; the bar needs redrawing
    Changed,
    /// Enter was pressed on this text
    Open(String),
}

/// Text plus a cursor, counted in characters.
#[derive(Debug, Clone)]
pub struct UrlBar {
    text: Vec<char>,
    cursor: usize,
    /// Pixel offset of each cursor position, supplied by text layout
    measures: Vec<f32>,
}

impl Default for UrlBar {
    fn default() -> Self {
        let text: Vec<char> = INITIAL_TEXT.chars().collect();
        let cursor = text.len();
        Self {
            text,
            cursor,
            measures: Vec::new(),
        }
    }
}

impl UrlBar {
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.cursor = self.text.len();
    }

    /// Offsets for cursor positions 0..=len, as measured by the renderer.
    pub fn set_measures(&mut self, measures: Vec<f32>) {
        self.measures = measures;
    }

    pub fn handle_key(&mut self, key: &Key) -> Option<UrlBarAction> {
        match key {
            Key::Backspace => {
                if self.cursor == 0 {
                    return None;
                }
                self.text.remove(self.cursor - 1);
                self.cursor -= 1;
            }
            Key::Delete => {
                if self.cursor >= self.text.len() {
                    return None;
                }
                self.text.remove(self.cursor);
            }
            Key::Space => self.insert(' '),
            Key::Enter => return Some(UrlBarAction::Open(self.text())),
            Key::Left => self.cursor = self.cursor.saturating_sub(1),
            Key::Right => self.cursor = (self.cursor + 1).min(self.text.len()),
            Key::Up => self.cursor = 0,
            Key::Down => self.cursor = self.text.len(),
            Key::Ignored => return None,
            Key::Char(c) => self.insert(*c),
        }
        Some(UrlBarAction::Changed)
    }

    /// Move the cursor to the boundary nearest bar pixel `x`.
    pub fn place_cursor(&mut self, x: f32) -> Option<UrlBarAction> {
        let text_x = x - TEXT_INSET;
        let (index, _) = self
            .measures
            .iter()
            .enumerate()
            .map(|(i, m)| (i, (m - text_x).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        self.cursor = index.min(self.text.len());
        Some(UrlBarAction::Changed)
    }

    fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += 1;
    }
}
