//! The synced editor surface
//!
//! One logical editing widget built from an authoritative text buffer and a
//! derived, regenerated-on-change highlighted presentation: the terminal
//! rendition of the original's invisible textarea stacked over a highlighted
//! `<pre>`. The two layers can differ only in presentation, never in
//! content: the highlighted lines are rebuilt from the buffer on every
//! change, and the buffer-side scroll offset is the single source of truth
//! the gutter and the highlight layer are both drawn from.

use crate::highlight::{HighlightedLine, Highlighter};
use unicode_width::UnicodeWidthChar;

/// Emitted synchronously for every content change. No buffering happens at
/// this layer; debouncing is the session's job.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChanged {
    pub text: String,
}

pub struct EditorSurface {
    /// Authoritative buffer, kept as lines. Always at least one line.
    lines: Vec<String>,
    /// Cursor position: line index and char column within that line.
    cursor_line: usize,
    cursor_col: usize,
    /// Scroll offset of the authoritative layer. The highlighted layer and
    /// the gutter mirror this on every render.
    top_line: usize,
    left_col: usize,
    /// Visible content area (excluding the gutter).
    width: u16,
    height: u16,
    /// Derived presentation layer.
    highlighted: Vec<HighlightedLine>,
    highlighter: Highlighter,
}

impl EditorSurface {
    pub fn new(text: &str, width: u16, height: u16) -> Self {
        let mut highlighter = Highlighter::new();
        let highlighted = highlighter.highlight(text);
        Self {
            lines: split_lines(text),
            cursor_line: 0,
            cursor_col: 0,
            top_line: 0,
            left_col: 0,
            width,
            height,
            highlighted,
            highlighter,
        }
    }

    /// The full buffer content.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Line count of the buffer; >= 1 even when the text is empty.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_line, self.cursor_col)
    }

    pub fn scroll_offset(&self) -> (usize, usize) {
        (self.top_line, self.left_col)
    }

    /// Gutter width derived from the line count: digits plus a separator
    /// column, minimum three digits.
    pub fn gutter_width(&self) -> u16 {
        let digits = self.line_count().to_string().len().max(3);
        digits as u16 + 1
    }

    /// The highlighted lines visible at the current scroll offset, paired
    /// with their 1-based line numbers. Both layers come off the same
    /// offset, which is what keeps them aligned.
    pub fn visible_lines(&self) -> impl Iterator<Item = (usize, &HighlightedLine)> {
        self.highlighted
            .iter()
            .enumerate()
            .skip(self.top_line)
            .take(self.height as usize)
            .map(|(i, line)| (i + 1, line))
    }

    /// Cursor position relative to the visible area, if on screen.
    pub fn cursor_screen_position(&self) -> Option<(u16, u16)> {
        if self.cursor_line < self.top_line
            || self.cursor_line >= self.top_line + self.height as usize
        {
            return None;
        }
        let col = self.display_col(self.cursor_line, self.cursor_col);
        if col < self.left_col || col >= self.left_col + self.width as usize {
            return None;
        }
        Some((
            (col - self.left_col) as u16,
            (self.cursor_line - self.top_line) as u16,
        ))
    }

    /// Replace the whole content. Re-highlights the derived layer and
    /// reports the change synchronously.
    pub fn set_text(&mut self, text: &str) -> ContentChanged {
        self.lines = split_lines(text);
        self.cursor_line = self.cursor_line.min(self.lines.len() - 1);
        self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_line));
        self.content_changed()
    }

    /// Resize the visible area. The derived layer keeps mirroring the
    /// (re-clamped) authoritative offset.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.sync_scroll();
    }

    /// Explicit scroll by line/column deltas. The offset is clamped and the
    /// cursor is left alone.
    pub fn scroll(&mut self, delta_lines: isize, delta_cols: isize) {
        // Scroll limiting: the last line stays at the bottom of the view.
        let max_top = self.line_count().saturating_sub(self.height.max(1) as usize);
        self.top_line = clamp_offset(self.top_line, delta_lines, max_top);
        self.left_col = clamp_offset(self.left_col, delta_cols, usize::MAX);
    }

    // --- editing operations; each mutates the buffer, then re-derives ---

    pub fn insert_char(&mut self, ch: char) -> ContentChanged {
        let byte = self.cursor_byte();
        self.lines[self.cursor_line].insert(byte, ch);
        self.cursor_col += 1;
        self.content_changed()
    }

    pub fn insert_newline(&mut self) -> ContentChanged {
        let byte = self.cursor_byte();
        let rest = self.lines[self.cursor_line].split_off(byte);
        self.cursor_line += 1;
        self.cursor_col = 0;
        self.lines.insert(self.cursor_line, rest);
        self.content_changed()
    }

    pub fn backspace(&mut self) -> Option<ContentChanged> {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
            let byte = self.cursor_byte();
            self.lines[self.cursor_line].remove(byte);
        } else if self.cursor_line > 0 {
            let line = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
            self.lines[self.cursor_line].push_str(&line);
        } else {
            return None;
        }
        Some(self.content_changed())
    }

    pub fn delete_forward(&mut self) -> Option<ContentChanged> {
        if self.cursor_col < self.line_len(self.cursor_line) {
            let byte = self.cursor_byte();
            self.lines[self.cursor_line].remove(byte);
        } else if self.cursor_line + 1 < self.lines.len() {
            let line = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&line);
        } else {
            return None;
        }
        Some(self.content_changed())
    }

    // --- cursor movement ---

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
        }
        self.sync_scroll();
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.line_len(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
        self.sync_scroll();
    }

    pub fn move_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_line));
        }
        self.sync_scroll();
    }

    pub fn move_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_line));
        }
        self.sync_scroll();
    }

    pub fn move_line_start(&mut self) {
        self.cursor_col = 0;
        self.sync_scroll();
    }

    pub fn move_line_end(&mut self) {
        self.cursor_col = self.line_len(self.cursor_line);
        self.sync_scroll();
    }

    pub fn page_up(&mut self) {
        let page = self.height.max(1) as usize;
        self.cursor_line = self.cursor_line.saturating_sub(page);
        self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_line));
        self.sync_scroll();
    }

    pub fn page_down(&mut self) {
        let page = self.height.max(1) as usize;
        self.cursor_line = (self.cursor_line + page).min(self.line_count() - 1);
        self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_line));
        self.sync_scroll();
    }

    // --- internals ---

    /// Re-highlight and re-mirror after a buffer mutation, and surface the
    /// new content to the caller.
    fn content_changed(&mut self) -> ContentChanged {
        let text = self.text();
        self.highlighted = self.highlighter.highlight(&text);
        self.sync_scroll();
        ContentChanged { text }
    }

    /// Force the derived layer's offset to the authoritative one: clamp to
    /// the buffer and keep the cursor inside the visible area. Called on
    /// every scroll, keystroke re-render and resize.
    fn sync_scroll(&mut self) {
        let height = self.height.max(1) as usize;
        let width = self.width.max(1) as usize;

        let max_top = self.line_count().saturating_sub(height);
        self.top_line = self.top_line.min(max_top);

        if self.cursor_line < self.top_line {
            self.top_line = self.cursor_line;
        } else if self.cursor_line >= self.top_line + height {
            self.top_line = self.cursor_line + 1 - height;
        }

        let col = self.display_col(self.cursor_line, self.cursor_col);
        if col < self.left_col {
            self.left_col = col;
        } else if col >= self.left_col + width {
            self.left_col = col + 1 - width;
        }
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines[line].chars().count()
    }

    /// Byte offset of the cursor within its line.
    fn cursor_byte(&self) -> usize {
        byte_of_char(&self.lines[self.cursor_line], self.cursor_col)
    }

    /// Display column of a char position, accounting for wide characters.
    fn display_col(&self, line: usize, col: usize) -> usize {
        self.lines[line]
            .chars()
            .take(col)
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }
}

fn split_lines(text: &str) -> Vec<String> {
    // split('\n') never yields an empty iterator, so the one-line minimum
    // holds even for "".
    text.split('\n').map(str::to_string).collect()
}

fn byte_of_char(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

fn clamp_offset(current: usize, delta: isize, max: usize) -> usize {
    if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize).min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::plain_text;

    #[test]
    fn empty_text_still_has_one_line() {
        let surface = EditorSurface::new("", 80, 24);
        assert_eq!(surface.line_count(), 1);
        assert_eq!(surface.text(), "");
    }

    #[test]
    fn set_text_emits_change_and_rehighlights() {
        let mut surface = EditorSurface::new("<b>a</b>", 80, 24);
        let change = surface.set_text("<i>b</i>");
        assert_eq!(change.text, "<i>b</i>");
        assert_eq!(plain_text(&surface.highlighted), "<i>b</i>");
    }

    #[test]
    fn typed_edits_round_trip_through_text() {
        let mut surface = EditorSurface::new("", 80, 24);
        for ch in "<p>".chars() {
            surface.insert_char(ch);
        }
        surface.insert_newline();
        let change = surface.insert_char('x');
        assert_eq!(change.text, "<p>\nx");
        assert_eq!(surface.line_count(), 2);
    }

    #[test]
    fn backspace_joins_lines() {
        let mut surface = EditorSurface::new("ab\ncd", 80, 24);
        surface.move_down();
        surface.move_line_start();
        let change = surface.backspace().unwrap();
        assert_eq!(change.text, "abcd");
        assert_eq!(surface.cursor(), (0, 2));
    }

    #[test]
    fn backspace_at_origin_is_noop() {
        let mut surface = EditorSurface::new("ab", 80, 24);
        assert!(surface.backspace().is_none());
    }

    #[test]
    fn scroll_mirrors_into_visible_lines() {
        let text = (1..=50)
            .map(|i| format!("line{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut surface = EditorSurface::new(&text, 80, 10);
        surface.scroll(20, 0);
        let first = surface.visible_lines().next().unwrap();
        assert_eq!(first.0, 21);

        // Scrolling past the end clamps.
        surface.scroll(1000, 0);
        assert_eq!(surface.scroll_offset().0, 40);
    }

    #[test]
    fn cursor_movement_keeps_cursor_visible() {
        let text = (1..=50)
            .map(|i| format!("line{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut surface = EditorSurface::new(&text, 80, 10);
        for _ in 0..30 {
            surface.move_down();
        }
        let (top, _) = surface.scroll_offset();
        assert!(surface.cursor().0 >= top);
        assert!(surface.cursor().0 < top + 10);
        assert!(surface.cursor_screen_position().is_some());
    }

    #[test]
    fn resize_reclamps_offset() {
        let text = (1..=20)
            .map(|i| format!("l{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut surface = EditorSurface::new(&text, 80, 5);
        surface.scroll(15, 0);
        surface.resize(80, 30);
        // All 20 lines now fit; offset snaps back so the buffer fills the view.
        assert_eq!(surface.scroll_offset().0, 0);
    }

    #[test]
    fn gutter_width_tracks_line_count() {
        let surface = EditorSurface::new("", 80, 24);
        assert_eq!(surface.gutter_width(), 4);

        let text = vec!["x"; 1200].join("\n");
        let surface = EditorSurface::new(&text, 80, 24);
        assert_eq!(surface.gutter_width(), 5);
    }

    #[test]
    fn wide_chars_use_display_width() {
        let mut surface = EditorSurface::new("中文ab", 10, 5);
        surface.move_right();
        surface.move_right();
        surface.move_right();
        // Two wide chars (2 cols each) + one narrow = display column 5.
        assert_eq!(surface.cursor_screen_position(), Some((5, 0)));
    }
}
