//! Logical text storage: lines, cursor, selection.
//!
//! Columns count chars, not bytes. Horizontal motion steps over whole
//! grapheme clusters so a cursor never lands inside one.

use unicode_segmentation::UnicodeSegmentation;

/// A caret position in logical space. Orders row-major.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPosition {
    pub row: usize,
    pub col: usize,
}

impl TextPosition {
    pub const ORIGIN: TextPosition = TextPosition { row: 0, col: 0 };

    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Normalized range, `start <= end`. Never empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl Selection {
    /// `None` when both ends coincide.
    pub fn between(a: TextPosition, b: TextPosition) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Less => Some(Self { start: a, end: b }),
            std::cmp::Ordering::Greater => Some(Self { start: b, end: a }),
        }
    }

    pub fn contains_row(&self, row: usize) -> bool {
        (self.start.row..=self.end.row).contains(&row)
    }

    /// Selected char range on `row`, given the row's length.
    pub fn cols_on_row(&self, row: usize, line_len: usize) -> Option<(usize, usize)> {
        if !self.contains_row(row) {
            return None;
        }
        let from = if row == self.start.row {
            self.start.col
        } else {
            0
        };
        let to = if row == self.end.row {
            self.end.col
        } else {
            line_len
        };
        Some((from.min(line_len), to.min(line_len)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    WordLeft,
    WordRight,
    LineStart,
    LineEnd,
    PageUp,
    PageDown,
    DocStart,
    DocEnd,
}

impl Motion {
    /// Motions that keep the remembered column.
    pub fn is_vertical(self) -> bool {
        matches!(
            self,
            Motion::Up | Motion::Down | Motion::PageUp | Motion::PageDown
        )
    }
}

/// Everything undo needs to put back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub lines: Vec<String>,
    pub cursor: TextPosition,
    pub selection: Option<Selection>,
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of char `col`, or `s.len()` past the end.
pub(crate) fn byte_at(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map(|(i, _)| i).unwrap_or(s.len())
}

pub(crate) fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let a = byte_at(s, from);
    let b = byte_at(s, to.max(from));
    &s[a..b]
}

fn prev_grapheme_boundary(text: &str, byte: usize) -> usize {
    let mut last = 0usize;
    for (i, _) in text.grapheme_indices(true) {
        if i >= byte {
            break;
        }
        last = i;
    }
    last
}

fn next_grapheme_boundary(text: &str, byte: usize) -> usize {
    for (i, _) in text.grapheme_indices(true) {
        if i > byte {
            return i;
        }
    }
    text.len()
}

#[derive(Clone, Debug)]
pub struct TextBuffer {
    lines: Vec<String>,
    cursor: TextPosition,
    selection: Option<Selection>,
    anchor: Option<TextPosition>,
    /// Column that vertical motion aims for across shorter lines.
    goal_col: Option<usize>,
    multiline: bool,
    revision: u64,
}

impl TextBuffer {
    pub fn new(multiline: bool) -> Self {
        Self {
            lines: vec![String::new()],
            cursor: TextPosition::ORIGIN,
            selection: None,
            anchor: None,
            goal_col: None,
            multiline,
            revision: 0,
        }
    }

    pub fn with_text(text: &str, multiline: bool) -> Self {
        let mut b = Self::new(multiline);
        b.set_text(text);
        b
    }

    pub fn multiline(&self) -> bool {
        self.multiline
    }

    pub fn set_multiline(&mut self, multiline: bool) {
        if self.multiline == multiline {
            return;
        }
        self.multiline = multiline;
        if !multiline && self.lines.len() > 1 {
            let joined = self.lines.join(" ");
            self.lines = vec![joined];
            self.touch();
            self.validate();
        }
    }

    /// Bumped on every text change; wrap caches key on it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.goal_col = None;
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map(String::as_str).unwrap_or("")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_len(&self, row: usize) -> usize {
        char_len(self.line(row))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn cursor(&self) -> TextPosition {
        self.cursor
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn anchor(&self) -> Option<TextPosition> {
        self.anchor
    }

    pub fn end_position(&self) -> TextPosition {
        let row = self.lines.len().saturating_sub(1);
        TextPosition::new(row, self.line_len(row))
    }

    /// Replaces everything. The cursor is kept where it still fits.
    pub fn set_text(&mut self, text: &str) {
        let text = self.normalize(text);
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if lines == self.lines {
            return;
        }
        self.lines = lines;
        self.selection = None;
        self.anchor = None;
        self.cursor = self.clamp(self.cursor);
        self.touch();
    }

    fn normalize(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if self.multiline {
            text
        } else {
            text.replace('\n', " ")
        }
    }

    pub fn clamp(&self, p: TextPosition) -> TextPosition {
        let row = p.row.min(self.lines.len().saturating_sub(1));
        TextPosition::new(row, p.col.min(self.line_len(row)))
    }

    /// Repairs out-of-range cursor, selection and anchor. Returns `true` if
    /// anything had to change.
    pub fn validate(&mut self) -> bool {
        let mut repaired = false;
        if self.lines.is_empty() {
            log::warn!("text buffer had no lines; restoring an empty one");
            self.lines.push(String::new());
            repaired = true;
        }
        let cursor = self.clamp(self.cursor);
        if cursor != self.cursor {
            log::warn!(
                "cursor {:?} out of range; clamped to {:?}",
                self.cursor,
                cursor
            );
            self.cursor = cursor;
            repaired = true;
        }
        if let Some(sel) = self.selection {
            let (s, e) = (self.clamp(sel.start), self.clamp(sel.end));
            if (s, e) != (sel.start, sel.end) {
                log::warn!("selection {:?} out of range; clamped", sel);
                self.selection = Selection::between(s, e);
                repaired = true;
            }
        }
        if let Some(a) = self.anchor {
            let clamped = self.clamp(a);
            if clamped != a {
                self.anchor = Some(clamped);
                repaired = true;
            }
        }
        repaired
    }

    // ---- selection ----

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.anchor = None;
    }

    /// Selects from `anchor` to `cursor`, leaving the cursor at `cursor`.
    pub fn select(&mut self, anchor: TextPosition, cursor: TextPosition) {
        let anchor = self.clamp(anchor);
        let cursor = self.clamp(cursor);
        self.anchor = Some(anchor);
        self.cursor = cursor;
        self.goal_col = None;
        self.selection = Selection::between(anchor, cursor);
    }

    pub fn select_all(&mut self) {
        self.select(TextPosition::ORIGIN, self.end_position());
    }

    pub fn selected_text(&self) -> Option<String> {
        let sel = self.selection?;
        Some(self.text_between(sel.start, sel.end))
    }

    pub fn text_between(&self, start: TextPosition, end: TextPosition) -> String {
        if start.row == end.row {
            return char_slice(self.line(start.row), start.col, end.col).to_string();
        }
        let mut out = String::new();
        let first = self.line(start.row);
        out.push_str(char_slice(first, start.col, char_len(first)));
        for row in start.row + 1..end.row {
            out.push('\n');
            out.push_str(self.line(row));
        }
        out.push('\n');
        out.push_str(char_slice(self.line(end.row), 0, end.col));
        out
    }

    // ---- motion ----

    /// Moves the cursor to `target`. Extending sets the anchor at the
    /// pre-move cursor the first time; a plain move drops selection and
    /// anchor.
    pub fn move_to(&mut self, target: TextPosition, extend: bool) {
        let target = self.clamp(target);
        self.goal_col = None;
        if extend {
            let anchor = *self.anchor.get_or_insert(self.cursor);
            self.cursor = target;
            self.selection = Selection::between(anchor, target);
        } else {
            self.clear_selection();
            self.cursor = target;
        }
    }

    pub fn move_cursor(&mut self, motion: Motion, extend: bool, lines_per_page: usize) {
        let goal = self.goal_col.unwrap_or(self.cursor.col);
        let target = self.position_after(motion, lines_per_page);
        self.move_to(target, extend);
        if motion.is_vertical() {
            self.goal_col = Some(goal);
        }
    }

    /// Where `motion` would put the cursor.
    pub fn position_after(&self, motion: Motion, lines_per_page: usize) -> TextPosition {
        let TextPosition { row, col } = self.cursor;
        let line = self.line(row);
        match motion {
            Motion::Left => {
                if col > 0 {
                    let prev = prev_grapheme_boundary(line, byte_at(line, col));
                    TextPosition::new(row, char_len(&line[..prev]))
                } else if row > 0 {
                    TextPosition::new(row - 1, self.line_len(row - 1))
                } else {
                    self.cursor
                }
            }
            Motion::Right => {
                if col < char_len(line) {
                    let next = next_grapheme_boundary(line, byte_at(line, col));
                    TextPosition::new(row, char_len(&line[..next]))
                } else if row + 1 < self.lines.len() {
                    TextPosition::new(row + 1, 0)
                } else {
                    self.cursor
                }
            }
            Motion::Up => self.vertical(true, 1),
            Motion::Down => self.vertical(false, 1),
            Motion::PageUp => self.vertical(true, lines_per_page.max(1)),
            Motion::PageDown => self.vertical(false, lines_per_page.max(1)),
            Motion::WordLeft => {
                let chars: Vec<char> = line.chars().collect();
                let mut c = col.min(chars.len());
                while c > 0 && chars[c - 1].is_whitespace() {
                    c -= 1;
                }
                while c > 0 && !chars[c - 1].is_whitespace() {
                    c -= 1;
                }
                TextPosition::new(row, c)
            }
            Motion::WordRight => {
                let chars: Vec<char> = line.chars().collect();
                let mut c = col.min(chars.len());
                while c < chars.len() && !chars[c].is_whitespace() {
                    c += 1;
                }
                while c < chars.len() && chars[c].is_whitespace() {
                    c += 1;
                }
                TextPosition::new(row, c)
            }
            Motion::LineStart => TextPosition::new(row, 0),
            Motion::LineEnd => TextPosition::new(row, char_len(line)),
            Motion::DocStart => TextPosition::ORIGIN,
            Motion::DocEnd => self.end_position(),
        }
    }

    fn vertical(&self, up: bool, rows: usize) -> TextPosition {
        let last = self.lines.len().saturating_sub(1);
        let row = if up {
            self.cursor.row.saturating_sub(rows)
        } else {
            self.cursor.row.saturating_add(rows).min(last)
        };
        if row == self.cursor.row {
            return self.cursor;
        }
        let col = self.goal_col.unwrap_or(self.cursor.col);
        TextPosition::new(row, col.min(self.line_len(row)))
    }

    // ---- editing ----

    /// Removes the selected text. Returns `false` without a selection.
    pub fn delete_selection(&mut self) -> bool {
        let Some(sel) = self.selection.take() else {
            return false;
        };
        self.anchor = None;
        let (s, e) = (self.clamp(sel.start), self.clamp(sel.end));
        let head = char_slice(self.line(s.row), 0, s.col).to_string();
        let tail_line = self.line(e.row);
        let tail = char_slice(tail_line, e.col, char_len(tail_line)).to_string();
        self.lines.splice(s.row..=e.row, [head + &tail]);
        self.cursor = s;
        self.touch();
        true
    }

    /// Inserts at the cursor, replacing the selection. Newlines split lines
    /// in multi-line mode and become spaces otherwise.
    pub fn insert(&mut self, text: &str) {
        self.delete_selection();
        self.anchor = None;
        if text.is_empty() {
            return;
        }
        let text = self.normalize(text);
        let TextPosition { row, col } = self.clamp(self.cursor);
        let line = self.line(row).to_string();
        let split = byte_at(&line, col);
        let (head, tail) = line.split_at(split);

        let mut parts = text.split('\n');
        let first = parts.next().unwrap_or("");
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() {
            self.lines[row] = format!("{}{}{}", head, first, tail);
            self.cursor = TextPosition::new(row, col + char_len(first));
        } else {
            let last = rest[rest.len() - 1];
            let mut new_lines = Vec::with_capacity(rest.len() + 1);
            new_lines.push(format!("{}{}", head, first));
            for part in &rest[..rest.len() - 1] {
                new_lines.push(part.to_string());
            }
            new_lines.push(format!("{}{}", last, tail));
            self.lines.splice(row..=row, new_lines);
            self.cursor = TextPosition::new(row + rest.len(), char_len(last));
        }
        self.touch();
    }

    /// Splits the line at the cursor. No-op in single-line mode.
    pub fn newline(&mut self) -> bool {
        if !self.multiline {
            return false;
        }
        self.insert("\n");
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        self.anchor = None;
        let TextPosition { row, col } = self.clamp(self.cursor);
        if col > 0 {
            let line = &self.lines[row];
            let end = byte_at(line, col);
            let start = prev_grapheme_boundary(line, end);
            let new_col = char_len(&line[..start]);
            self.lines[row].replace_range(start..end, "");
            self.cursor = TextPosition::new(row, new_col);
        } else if row > 0 {
            let line = self.lines.remove(row);
            let prev_len = self.line_len(row - 1);
            self.lines[row - 1].push_str(&line);
            self.cursor = TextPosition::new(row - 1, prev_len);
        } else {
            return false;
        }
        self.touch();
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        self.anchor = None;
        let TextPosition { row, col } = self.clamp(self.cursor);
        if col < self.line_len(row) {
            let line = &self.lines[row];
            let start = byte_at(line, col);
            let end = next_grapheme_boundary(line, start);
            self.lines[row].replace_range(start..end, "");
        } else if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
        } else {
            return false;
        }
        self.cursor = TextPosition::new(row, col);
        self.touch();
        true
    }

    // ---- snapshots ----

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            lines: self.lines.clone(),
            cursor: self.cursor,
            selection: self.selection,
        }
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.lines = snapshot.lines.clone();
        self.cursor = snapshot.cursor;
        self.selection = snapshot.selection;
        self.anchor = None;
        self.touch();
        self.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> TextPosition {
        TextPosition::new(row, col)
    }

    #[test]
    fn test_insert_splits_lines_and_places_cursor() {
        let mut b = TextBuffer::new(true);
        b.insert("ab");
        b.move_to(pos(0, 1), false);
        b.insert("X\nY\nZ");
        assert_eq!(b.lines(), &["aX", "Y", "Zb"]);
        assert_eq!(b.cursor(), pos(2, 1));
    }

    #[test]
    fn test_single_line_flattens_newlines() {
        let mut b = TextBuffer::new(false);
        b.insert("one\ntwo\r\nthree");
        assert_eq!(b.text(), "one two three");
        assert!(!b.newline());
        assert_eq!(b.line_count(), 1);
    }

    #[test]
    fn test_backspace_joins_lines_and_respects_graphemes() {
        let mut b = TextBuffer::with_text("ab\ne\u{301}", true);
        b.move_to(b.end_position(), false);
        assert!(b.backspace());
        assert_eq!(b.lines(), &["ab", ""]);
        assert!(b.backspace());
        assert_eq!(b.text(), "ab");
        assert_eq!(b.cursor(), pos(0, 2));
        b.move_to(pos(0, 0), false);
        assert!(!b.backspace());
    }

    #[test]
    fn test_delete_forward_joins_next_line() {
        let mut b = TextBuffer::with_text("ab\ncd", true);
        b.move_to(pos(0, 2), false);
        assert!(b.delete());
        assert_eq!(b.text(), "abcd");
        b.move_to(b.end_position(), false);
        assert!(!b.delete());
    }

    #[test]
    fn test_right_skips_whole_cluster() {
        let mut b = TextBuffer::with_text("e\u{301}x", false);
        b.move_cursor(Motion::Right, false, 1);
        assert_eq!(b.cursor(), pos(0, 2));
        b.move_cursor(Motion::Left, false, 1);
        assert_eq!(b.cursor(), pos(0, 0));
    }

    #[test]
    fn test_anchor_is_set_once_and_cleared_by_plain_move() {
        let mut b = TextBuffer::with_text("hello world", false);
        b.move_to(pos(0, 5), false);
        b.move_cursor(Motion::Right, true, 1);
        b.move_cursor(Motion::Right, true, 1);
        assert_eq!(b.anchor(), Some(pos(0, 5)));
        assert_eq!(b.selected_text().as_deref(), Some(" w"));

        // Crossing back over the anchor flips the normalized range.
        for _ in 0..4 {
            b.move_cursor(Motion::Left, true, 1);
        }
        assert_eq!(b.selection(), Selection::between(pos(0, 3), pos(0, 5)));

        b.move_cursor(Motion::Left, false, 1);
        assert_eq!(b.selection(), None);
        assert_eq!(b.anchor(), None);
    }

    #[test]
    fn test_word_and_page_motion() {
        let mut b = TextBuffer::with_text("foo  bar baz\n1\n2\n3\n4", true);
        b.move_cursor(Motion::WordRight, false, 1);
        assert_eq!(b.cursor(), pos(0, 5));
        b.move_cursor(Motion::LineEnd, false, 1);
        b.move_cursor(Motion::WordLeft, false, 1);
        assert_eq!(b.cursor(), pos(0, 9));
        b.move_cursor(Motion::PageDown, false, 3);
        assert_eq!(b.cursor(), pos(3, 1));
        b.move_cursor(Motion::PageDown, false, 3);
        assert_eq!(b.cursor(), pos(4, 1));
        b.move_cursor(Motion::DocStart, true, 1);
        assert_eq!(
            b.selected_text().as_deref(),
            Some("foo  bar baz\n1\n2\n3\n4")
        );
    }

    #[test]
    fn test_selection_delete_across_lines() {
        let mut b = TextBuffer::with_text("abc\ndef\nghi", true);
        b.select(pos(0, 1), pos(2, 1));
        assert_eq!(b.selected_text().as_deref(), Some("bc\ndef\ng"));
        b.insert("-");
        assert_eq!(b.text(), "a-hi");
        assert_eq!(b.cursor(), pos(0, 2));
    }

    #[test]
    fn test_validate_repairs_stale_positions() {
        let mut b = TextBuffer::with_text("abc\ndef", true);
        b.select(pos(1, 3), pos(0, 0));
        let snap = Snapshot {
            lines: vec!["x".into()],
            cursor: pos(1, 3),
            selection: Selection::between(pos(0, 0), pos(1, 3)),
        };
        b.restore(&snap);
        assert_eq!(b.cursor(), pos(0, 1));
        assert_eq!(b.selection(), Selection::between(pos(0, 0), pos(0, 1)));
        assert!(!b.validate());
    }

    #[test]
    fn test_vertical_motion_keeps_goal_column() {
        let mut b = TextBuffer::with_text("abcdefgh\nab\nabcdefgh", true);
        b.move_to(pos(0, 6), false);
        b.move_cursor(Motion::Down, false, 1);
        assert_eq!(b.cursor(), pos(1, 2));
        b.move_cursor(Motion::Down, false, 1);
        assert_eq!(b.cursor(), pos(2, 6));
        b.move_cursor(Motion::Up, true, 1);
        b.move_cursor(Motion::Up, true, 1);
        assert_eq!(b.cursor(), pos(0, 6));

        // A horizontal move forgets the goal.
        b.move_cursor(Motion::Down, false, 1);
        b.move_cursor(Motion::Left, false, 1);
        b.move_cursor(Motion::Down, false, 1);
        assert_eq!(b.cursor(), pos(2, 1));

        // So does an edit.
        b.move_to(pos(0, 6), false);
        b.move_cursor(Motion::Down, false, 1);
        b.insert("x");
        b.move_cursor(Motion::Down, false, 1);
        assert_eq!(b.cursor(), pos(2, 3));
    }

    #[test]
    fn test_huge_page_moves_to_the_ends() {
        let mut b = TextBuffer::with_text("a\nb\nc", true);
        b.move_cursor(Motion::PageDown, false, usize::MAX);
        assert_eq!(b.cursor(), pos(2, 0));
        b.move_cursor(Motion::PageUp, false, usize::MAX);
        assert_eq!(b.cursor(), pos(0, 0));
    }
}
