//! Single-line text editing: value, cursor, selection, and a bounded
//! undo stack.
//!
//! Cursor positions are grapheme indexes, not bytes. Contiguous typing
//! coalesces into one undo step when the events fall within a short
//! window, measured on event `time_ms`.

use twire::keys::{self, mods};

use crate::glyph::grapheme_count;

/// Maximum retained undo entries.
const UNDO_CAP: usize = 100;

/// Typing within this window coalesces into the previous undo step.
const COALESCE_MS: u64 = 400;

/// What one editor keystroke produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub changed: bool,
    pub submitted: bool,
    pub consumed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Snapshot {
    value: String,
    cursor: usize,
}

/// Editor state for one input widget, owned by the local stores.
#[derive(Debug, Default)]
pub struct InputEditor {
    value: String,
    cursor: usize,
    selection_start: Option<usize>,
    selection_end: Option<usize>,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    clipboard: String,
    last_edit_ms: Option<u64>,
}

impl InputEditor {
    pub fn new(value: &str) -> Self {
        Self {
            cursor: grapheme_count(value),
            value: value.to_string(),
            ..Default::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        match (self.selection_start, self.selection_end) {
            (Some(a), Some(b)) if a != b => Some((a.min(b), a.max(b))),
            _ => None,
        }
    }

    /// Adopts an externally-changed prop value, dropping history.
    pub fn sync_value(&mut self, value: &str) {
        if self.value != value {
            self.value = value.to_string();
            self.cursor = self.cursor.min(grapheme_count(value));
            self.clear_selection();
            self.undo.clear();
            self.redo.clear();
            self.last_edit_ms = None;
        }
    }

    fn clear_selection(&mut self) {
        self.selection_start = None;
        self.selection_end = None;
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            value: self.value.clone(),
            cursor: self.cursor,
        }
    }

    /// Pushes an undo entry unless this edit coalesces with the last.
    fn remember(&mut self, now_ms: u64, coalesce: bool) {
        let within = self
            .last_edit_ms
            .is_some_and(|t| now_ms.saturating_sub(t) <= COALESCE_MS);
        if !(coalesce && within) {
            self.undo.push(self.snapshot());
            if self.undo.len() > UNDO_CAP {
                self.undo.remove(0);
            }
        }
        self.redo.clear();
        self.last_edit_ms = Some(now_ms);
    }

    fn byte_at(&self, grapheme: usize) -> usize {
        self.value
            .grapheme_byte_offsets()
            .get(grapheme)
            .map_or(self.value.len(), |(at, _)| *at)
    }

    fn delete_selection(&mut self) -> bool {
        let Some((a, b)) = self.selection() else {
            return false;
        };
        let start = self.byte_at(a);
        let end = self.byte_at(b);
        self.value.replace_range(start..end, "");
        self.cursor = a;
        self.clear_selection();
        true
    }

    fn selected_text(&self) -> Option<String> {
        let (a, b) = self.selection()?;
        let start = self.byte_at(a);
        let end = self.byte_at(b);
        Some(self.value[start..end].to_string())
    }

    pub fn insert_char(&mut self, ch: char, now_ms: u64) {
        self.remember(now_ms, true);
        self.delete_selection();
        let at = self.byte_at(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str, now_ms: u64) {
        if text.is_empty() {
            return;
        }
        self.remember(now_ms, false);
        self.delete_selection();
        let at = self.byte_at(self.cursor);
        self.value.insert_str(at, text);
        self.cursor += grapheme_count(text);
    }

    fn backspace(&mut self, now_ms: u64) -> bool {
        self.remember(now_ms, true);
        if self.delete_selection() {
            return true;
        }
        if self.cursor == 0 {
            return false;
        }
        let start = self.byte_at(self.cursor - 1);
        let end = self.byte_at(self.cursor);
        self.value.replace_range(start..end, "");
        self.cursor -= 1;
        true
    }

    fn delete(&mut self, now_ms: u64) -> bool {
        self.remember(now_ms, true);
        if self.delete_selection() {
            return true;
        }
        if self.cursor >= grapheme_count(&self.value) {
            return false;
        }
        let start = self.byte_at(self.cursor);
        let end = self.byte_at(self.cursor + 1);
        self.value.replace_range(start..end, "");
        true
    }

    fn move_cursor(&mut self, to: usize, extend: bool) {
        let to = to.min(grapheme_count(&self.value));
        if extend {
            if self.selection_start.is_none() {
                self.selection_start = Some(self.cursor);
            }
            self.selection_end = Some(to);
        } else {
            self.clear_selection();
        }
        self.cursor = to;
    }

    fn undo(&mut self) -> bool {
        let Some(prev) = self.undo.pop() else {
            return false;
        };
        self.redo.push(self.snapshot());
        self.value = prev.value;
        self.cursor = prev.cursor;
        self.clear_selection();
        self.last_edit_ms = None;
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        self.undo.push(self.snapshot());
        self.value = next.value;
        self.cursor = next.cursor;
        self.clear_selection();
        self.last_edit_ms = None;
        true
    }

    /// Routes a key-down through the editor.
    pub fn route_key(&mut self, key: u16, m: u8, now_ms: u64) -> EditOutcome {
        let shift = m & mods::SHIFT != 0;
        let ctrl = m & mods::CTRL != 0;
        let mut out = EditOutcome {
            consumed: true,
            ..Default::default()
        };
        match key {
            keys::ENTER => {
                out.submitted = true;
            }
            keys::BACKSPACE => out.changed = self.backspace(now_ms),
            keys::DELETE => out.changed = self.delete(now_ms),
            keys::LEFT => {
                self.move_cursor(self.cursor.saturating_sub(1), shift);
                out.changed = true;
            }
            keys::RIGHT => {
                self.move_cursor(self.cursor + 1, shift);
                out.changed = true;
            }
            keys::HOME => {
                self.move_cursor(0, shift);
                out.changed = true;
            }
            keys::END => {
                self.move_cursor(grapheme_count(&self.value), shift);
                out.changed = true;
            }
            k if ctrl && k == keys::from_char('a').unwrap_or(0) => {
                self.selection_start = Some(0);
                let end = grapheme_count(&self.value);
                self.selection_end = Some(end);
                self.cursor = end;
                out.changed = true;
            }
            k if ctrl && k == keys::from_char('c').unwrap_or(0) => {
                if let Some(text) = self.selected_text() {
                    self.clipboard = text;
                }
            }
            k if ctrl && k == keys::from_char('x').unwrap_or(0) => {
                if let Some(text) = self.selected_text() {
                    self.clipboard = text;
                    self.remember(now_ms, false);
                    self.delete_selection();
                    out.changed = true;
                }
            }
            k if ctrl && k == keys::from_char('v').unwrap_or(0) => {
                let text = self.clipboard.clone();
                if !text.is_empty() {
                    self.insert_str(&text, now_ms);
                    out.changed = true;
                }
            }
            k if ctrl && shift && k == keys::from_char('z').unwrap_or(0) => {
                out.changed = self.redo();
            }
            k if ctrl && k == keys::from_char('z').unwrap_or(0) => {
                out.changed = self.undo();
            }
            k if ctrl && k == keys::from_char('y').unwrap_or(0) => {
                out.changed = self.redo();
            }
            _ => out.consumed = false,
        }
        out
    }
}

/// Grapheme iteration helper shared with the renderer.
trait GraphemeOffsets {
    fn grapheme_byte_offsets(&self) -> Vec<(usize, &str)>;
}

impl GraphemeOffsets for String {
    fn grapheme_byte_offsets(&self) -> Vec<(usize, &str)> {
        use unicode_segmentation::UnicodeSegmentation;
        self.grapheme_indices(true).collect()
    }
}
