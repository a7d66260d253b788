//! Greedy word wrap and display/logical addressing.
//!
//! A logical line becomes one or more [`Segment`]s, each a char range of the
//! line. The space a line breaks on belongs to neither neighbour, so it is
//! never drawn at the start of a display row.

use ahash::AHashMap;
use vellum_core::TextMeasure;

use super::buffer::{TextBuffer, TextPosition, char_len, char_slice};

/// Wrapped lines are allowed this close to the limit before breaking.
const WIDTH_SLACK: f32 = 2.0;

const MEASURE_CACHE_LIMIT: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Segment {
    fn of(line: &str, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: char_slice(line, start, end).to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `line` into display segments no wider than `max_width`.
///
/// Breaks on single spaces. A word that cannot fit on a row of its own is
/// split by character.
pub fn wrap_line(line: &str, max_width: f32, measure: &mut dyn FnMut(&str) -> f32) -> Vec<Segment> {
    if line.is_empty() {
        return vec![Segment::of(line, 0, 0)];
    }
    if measure(line) <= max_width {
        return vec![Segment::of(line, 0, char_len(line))];
    }

    let limit = max_width - WIDTH_SLACK;
    let space = measure(" ");
    let mut out = Vec::new();
    // (start, end, width) of the row being filled
    let mut current: Option<(usize, usize, f32)> = None;

    let mut word_start = 0usize;
    for word in line.split(' ') {
        let len = char_len(word);
        let word_end = word_start + len;
        let width = measure(word);

        let fitted = match current {
            Some((s, _, w)) if w + space + width <= limit => Some((s, word_end, w + space + width)),
            None if width <= limit => Some((word_start, word_end, width)),
            _ => None,
        };

        match fitted {
            Some(row) => current = Some(row).filter(|(s, e, _)| e > s),
            None => {
                if let Some((s, e, _)) = current.take() {
                    out.push(Segment::of(line, s, e));
                }
                if width <= limit {
                    current = Some((word_start, word_end, width)).filter(|(s, e, _)| e > s);
                } else {
                    let mut pieces = break_word(line, word_start, word_end, limit, measure);
                    let last = pieces.pop();
                    out.extend(pieces);
                    current = last.map(|seg| {
                        let w = measure(&seg.text);
                        (seg.start, seg.end, w)
                    });
                }
            }
        }
        word_start = word_end + 1;
    }
    if let Some((s, e, _)) = current {
        out.push(Segment::of(line, s, e));
    }
    if out.is_empty() {
        out.push(Segment::of(line, 0, char_len(line)));
    }
    out
}

fn break_word(
    line: &str,
    start: usize,
    end: usize,
    limit: f32,
    measure: &mut dyn FnMut(&str) -> f32,
) -> Vec<Segment> {
    let word = char_slice(line, start, end);
    let mut out = Vec::new();
    let mut piece_start = start;
    let mut width = 0.0;
    for (i, ch) in word.chars().enumerate() {
        let mut buf = [0u8; 4];
        let w = measure(ch.encode_utf8(&mut buf));
        let col = start + i;
        if width + w <= limit || col == piece_start {
            width += w;
        } else {
            out.push(Segment::of(line, piece_start, col));
            piece_start = col;
            width = w;
        }
    }
    if piece_start < end {
        out.push(Segment::of(line, piece_start, end));
    }
    out
}

/// Wrapped rows for a whole buffer, recomputed only when the buffer
/// revision, the wrap width or the font size changes.
#[derive(Default)]
pub struct WrapCache {
    key: Option<(u64, u32, u32)>,
    rows: Vec<Vec<Segment>>,
    widths: AHashMap<(String, u32), f32>,
}

impl WrapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops wrapped rows and cached measurements.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.rows.clear();
        self.widths.clear();
    }

    /// Cached width of `text`.
    pub fn measure(&mut self, text: &str, font_size: f32, measure: &dyn TextMeasure) -> f32 {
        cached_width(&mut self.widths, text, font_size, measure)
    }

    /// Re-wraps if the key changed. Returns `true` when it did.
    pub fn ensure(
        &mut self,
        buffer: &TextBuffer,
        width: f32,
        font_size: f32,
        measure: &dyn TextMeasure,
    ) -> bool {
        let key = (buffer.revision(), width.to_bits(), font_size.to_bits());
        if self.key == Some(key) && self.rows.len() == buffer.line_count() {
            return false;
        }
        let widths = &mut self.widths;
        let mut m = |s: &str| cached_width(widths, s, font_size, measure);
        let rows: Vec<Vec<Segment>> = buffer
            .lines()
            .iter()
            .map(|line| wrap_line(line, width, &mut m))
            .collect();
        log::trace!("wrapped {} line(s) at {}px", rows.len(), width);
        self.rows = rows;
        self.key = Some(key);
        true
    }

    pub fn rows(&self) -> &[Vec<Segment>] {
        &self.rows
    }

    pub fn segments(&self, row: usize) -> &[Segment] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total display rows, at least one.
    pub fn display_line_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum::<usize>().max(1)
    }

    /// Logical row and segment index shown on `display_row`. Rows past the
    /// end resolve to the last segment.
    pub fn locate(&self, display_row: usize) -> (usize, usize) {
        let mut first = 0;
        for (row, segs) in self.rows.iter().enumerate() {
            let n = segs.len().max(1);
            if display_row < first + n {
                return (row, display_row - first);
            }
            first += n;
        }
        match self.rows.last() {
            Some(segs) => (self.rows.len() - 1, segs.len().saturating_sub(1)),
            None => (0, 0),
        }
    }

    pub fn to_display(&self, p: TextPosition) -> (usize, usize) {
        let before: usize = self.rows.iter().take(p.row).map(|s| s.len().max(1)).sum();
        let segs = self.segments(p.row);
        let Some(last) = segs.len().checked_sub(1) else {
            return (before, 0);
        };
        for (i, seg) in segs.iter().enumerate() {
            if p.col <= seg.end || i == last {
                let col = p.col.saturating_sub(seg.start).min(seg.len());
                return (before + i, col);
            }
        }
        (before + last, 0)
    }

    pub fn to_logical(&self, display_row: usize, display_col: usize) -> TextPosition {
        let (row, seg) = self.locate(display_row);
        match self.segments(row).get(seg) {
            Some(s) => TextPosition::new(row, s.start + display_col.min(s.len())),
            None => TextPosition::new(row, 0),
        }
    }
}

fn cached_width(
    cache: &mut AHashMap<(String, u32), f32>,
    text: &str,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> f32 {
    let key = (text.to_string(), font_size.to_bits());
    if let Some(w) = cache.get(&key) {
        return *w;
    }
    if cache.len() >= MEASURE_CACHE_LIMIT {
        cache.clear();
    }
    let w = measure.measure(text, font_size).width;
    cache.insert(key, w);
    w
}
