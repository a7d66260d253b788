//! # Text input
//!
//! A multi-line (or single-line) editable text box.
//!
//! The editing model lives in [`TextBuffer`]: logical lines, a cursor in
//! `(row, col)` chars, and a normalized selection with its anchor. Display
//! rows come from the [`WrapCache`]; every edit happens in logical space and
//! is mapped to display rows only for drawing, hit-testing and scrolling.
//!
//! Rows are laid out top-down from the top of the content area. With
//! `scroll_y == 0` the first line sits at the top; larger offsets reveal
//! later lines.
//!
//! ```rust
//! use std::rc::Rc;
//! use vellum_core::*;
//! use vellum_core::headless::MonospaceMeasure;
//! use vellum_ui::TextInput;
//!
//! let mut input = TextInput::new(
//!     Bounds::new(0.0, 0.0, 300.0, 120.0),
//!     Rc::new(MonospaceMeasure::default()),
//! );
//! input.set_text("draft");
//!
//! let mut clipboard = MemoryClipboard::default();
//! let mut ctx = EventCtx::new(&mut clipboard, Size::new(800.0, 600.0));
//! input.set_focused(true);
//! input.handle_event(&UiEvent::text("!"), &mut ctx);
//! assert_eq!(input.text(), "draft!");
//! ```

pub mod buffer;
pub mod history;
pub mod keymap;
pub mod wrap;

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use vellum_core::{
    Bounds, Color, Component, ComponentBase, CursorType, EventCtx, EventType, Insets,
    Invalidatable, KeyCombo, Renderer, TextMeasure, UiEvent, Vec2,
};

pub use buffer::{Motion, Selection, Snapshot, TextBuffer, TextPosition};
pub use history::{EditKind, History};
pub use keymap::{EditCommand, KeyMap, is_host_shortcut};
pub use wrap::{Segment, WrapCache, wrap_line};

const INDICATOR_WIDTH: f32 = 4.0;
const MIN_THUMB: f32 = 20.0;
const CLICK_TOLERANCE: f32 = 10.0;
const MIN_USABLE_WIDTH: f32 = 30.0;
const MIN_SAFETY_MARGIN: f32 = 4.0;
const SAFETY_MARGIN_RATIO: f32 = 0.02;
const RESIZE_SLACK_LINES: f32 = 0.6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextInputConfig {
    pub multiline: bool,
    pub placeholder: String,
    /// Extra space inside the style padding.
    pub content_padding: Insets,
    /// Grow and shrink with the content between `min_height` and
    /// `max_height`; scroll once `max_height` is reached.
    pub auto_resize: bool,
    pub min_height: f32,
    pub max_height: f32,
    /// Height changes smaller than this are ignored.
    pub resize_threshold: f32,
    pub line_height_factor: f32,
    /// Pixels per wheel notch.
    pub wheel_sensitivity: f32,
    /// Distance from an edge at which a selection drag starts scrolling.
    pub scroll_margin: f32,
    /// Pixels scrolled per drag event or frame while near an edge.
    pub scroll_speed: f32,
    /// Pointer travel before a press becomes a drag.
    pub drag_threshold: f32,
    pub blink_interval_ms: u64,
    pub history_capacity: usize,
}

impl Default for TextInputConfig {
    fn default() -> Self {
        Self {
            multiline: true,
            placeholder: String::new(),
            content_padding: Insets::ZERO,
            auto_resize: false,
            min_height: 60.0,
            max_height: 800.0,
            resize_threshold: 5.0,
            line_height_factor: 1.21,
            wheel_sensitivity: 30.0,
            scroll_margin: 20.0,
            scroll_speed: 20.0,
            drag_threshold: 3.0,
            blink_interval_ms: 500,
            history_capacity: history::DEFAULT_CAPACITY,
        }
    }
}

pub type TextCallback = Rc<dyn Fn(&str)>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollInfo {
    pub scrollable: bool,
    pub offset: f32,
    pub max_offset: f32,
    /// 0..=100
    pub percentage: f32,
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    anchor: TextPosition,
    origin: Vec2,
    pointer: Vec2,
    moved: bool,
}

fn nearest_caret(positions: &[f32], x: f32) -> usize {
    let mut best = 0usize;
    let mut dmin = f32::INFINITY;
    for (i, &p) in positions.iter().enumerate() {
        let d = (p - x).abs();
        if d < dmin {
            dmin = d;
            best = i;
        }
    }
    best
}

pub struct TextInput {
    base: ComponentBase,
    config: TextInputConfig,
    buffer: TextBuffer,
    history: History,
    wrap: WrapCache,
    keymap: KeyMap,
    measure: Rc<dyn TextMeasure>,

    scroll_y: f32,
    max_scroll_y: f32,
    scrollable: bool,
    scroll_x: f32,
    max_scroll_x: f32,

    drag: Option<DragState>,
    blink_start: Instant,
    caret_shown: bool,

    on_submit: Option<TextCallback>,
    on_change: Option<TextCallback>,
}

impl TextInput {
    pub fn new(bounds: Bounds, measure: Rc<dyn TextMeasure>) -> Self {
        Self::with_config(bounds, TextInputConfig::default(), measure)
    }

    pub fn with_config(
        bounds: Bounds,
        config: TextInputConfig,
        measure: Rc<dyn TextMeasure>,
    ) -> Self {
        let mut base = ComponentBase::new(bounds);
        base.focusable = true;
        base.cursor = CursorType::Text;
        let buffer = TextBuffer::new(config.multiline);
        let history = History::new(buffer.snapshot(), config.history_capacity);
        let mut input = Self {
            base,
            config,
            buffer,
            history,
            wrap: WrapCache::new(),
            keymap: KeyMap::default(),
            measure,
            scroll_y: 0.0,
            max_scroll_y: 0.0,
            scrollable: false,
            scroll_x: 0.0,
            max_scroll_x: 0.0,
            drag: None,
            blink_start: Instant::now(),
            caret_shown: true,
            on_submit: None,
            on_change: None,
        };
        input.refresh();
        input
    }

    // ---- configuration ----

    pub fn config(&self) -> &TextInputConfig {
        &self.config
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.config.placeholder = placeholder.into();
    }

    pub fn set_multiline(&mut self, multiline: bool) {
        self.config.multiline = multiline;
        self.buffer.set_multiline(multiline);
        self.scroll_y = 0.0;
        self.scroll_x = 0.0;
        self.refresh();
    }

    pub fn set_auto_resize(&mut self, enabled: bool, min_height: f32, max_height: f32) {
        self.config.auto_resize = enabled;
        self.config.min_height = min_height;
        self.config.max_height = max_height.max(min_height);
        self.refresh();
    }

    pub fn set_content_padding(&mut self, padding: Insets) {
        self.config.content_padding = padding;
        self.refresh();
    }

    pub fn content_padding(&self) -> Insets {
        self.config.content_padding
    }

    pub fn keymap_mut(&mut self) -> &mut KeyMap {
        &mut self.keymap
    }

    pub fn on_submit(&mut self, f: impl Fn(&str) + 'static) {
        self.on_submit = Some(Rc::new(f));
    }

    pub fn on_change(&mut self, f: impl Fn(&str) + 'static) {
        self.on_change = Some(Rc::new(f));
    }

    // ---- content ----

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn cursor(&self) -> TextPosition {
        self.buffer.cursor()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.buffer.selection()
    }

    pub fn selected_text(&self) -> Option<String> {
        self.buffer.selected_text()
    }

    /// Replaces the text as one undoable step.
    pub fn set_text(&mut self, text: &str) {
        self.edit(EditKind::Other, None, |b| b.set_text(text));
    }

    /// Empties the box and forgets the undo history.
    pub fn clear(&mut self) {
        self.buffer.set_text("");
        self.history.reset(self.buffer.snapshot());
        self.scroll_y = 0.0;
        self.scroll_x = 0.0;
        self.changed(None);
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(true, None)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(false, None)
    }

    // ---- geometry ----

    pub fn line_height(&self) -> f32 {
        (self.base.style.font_size * self.config.line_height_factor)
            .ceil()
            .max(1.0)
    }

    fn vertical_chrome(&self) -> f32 {
        let s = &self.base.style;
        let cp = self.config.content_padding;
        2.0 * s.padding + cp.top + cp.bottom + 2.0 * s.border_width
    }

    /// Where text is laid out, inside padding and border.
    pub fn content_rect(&self) -> Bounds {
        let b = self.base.bounds;
        let s = &self.base.style;
        let cp = self.config.content_padding;
        let w = b.width - (2.0 * s.padding + cp.left + cp.right + 2.0 * s.border_width);
        let h = b.height - self.vertical_chrome();
        Bounds::new(
            b.x + s.padding + cp.left,
            b.y + s.padding + cp.bottom,
            w.max(0.0),
            h.max(0.0),
        )
    }

    /// Width available to wrapped text, with a small safety margin.
    pub fn usable_width(&self) -> f32 {
        let w = self.content_rect().width;
        let margin = MIN_SAFETY_MARGIN.max((w * SAFETY_MARGIN_RATIO).ceil());
        (w - margin).max(MIN_USABLE_WIDTH)
    }

    fn wrap_width(&self) -> f32 {
        if self.buffer.multiline() {
            self.usable_width()
        } else {
            f32::INFINITY
        }
    }

    pub fn display_line_count(&mut self) -> usize {
        self.refresh();
        self.wrap.display_line_count()
    }

    fn lines_per_page(&self) -> usize {
        ((self.content_rect().height / self.line_height()).floor() as usize).max(1)
    }

    /// Bottom edge of display row `k` (multi-line) or of the centred line.
    fn row_y(&self, k: usize) -> f32 {
        let lh = self.line_height();
        if self.buffer.multiline() {
            let c = self.content_rect();
            c.y + c.height - lh - k as f32 * lh + self.scroll_y
        } else {
            let b = self.base.bounds;
            b.y + (b.height - lh) / 2.0
        }
    }

    fn text_width(&mut self, text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let fs = self.base.style.font_size;
        self.wrap.measure(text, fs, self.measure.as_ref())
    }

    /// Re-wraps if needed and recomputes scroll limits and auto height.
    fn refresh(&mut self) {
        let width = self.wrap_width();
        let fs = self.base.style.font_size;
        self.wrap
            .ensure(&self.buffer, width, fs, self.measure.as_ref());
        if self.buffer.multiline() {
            self.update_vertical_limits();
        } else {
            self.update_horizontal_limits();
        }
    }

    fn update_vertical_limits(&mut self) {
        let lh = self.line_height();
        let content_h = self.wrap.display_line_count() as f32 * lh;
        self.max_scroll_x = 0.0;
        self.scroll_x = 0.0;

        if self.config.auto_resize {
            let chrome = self.vertical_chrome();
            let required = content_h + chrome + RESIZE_SLACK_LINES * lh;
            let (min_h, max_h) = (self.config.min_height, self.config.max_height);
            let new_h = required.clamp(min_h, max_h.max(min_h));
            if required > max_h {
                self.scrollable = true;
                self.max_scroll_y = (content_h - (max_h - chrome)).max(0.0);
            } else {
                self.scrollable = false;
                self.max_scroll_y = 0.0;
            }
            let b = self.base.bounds;
            if (new_h - b.height).abs() > self.config.resize_threshold {
                log::debug!("text input height {} -> {}", b.height, new_h);
                self.base.bounds = Bounds::new(b.x, b.y, b.width, new_h);
            }
        } else {
            let visible = self.content_rect().height;
            self.max_scroll_y = (content_h - visible).max(0.0);
            self.scrollable = self.max_scroll_y > 0.0;
        }
        self.scroll_y = self.scroll_y.clamp(0.0, self.max_scroll_y);
    }

    fn update_horizontal_limits(&mut self) {
        self.scrollable = false;
        self.max_scroll_y = 0.0;
        self.scroll_y = 0.0;
        let line = self.buffer.line(0).to_string();
        let text_w = self.text_width(&line);
        let avail = self.usable_width();
        self.max_scroll_x = (text_w - avail).max(0.0);
        self.scroll_x = self.scroll_x.clamp(0.0, self.max_scroll_x);
    }

    // ---- scrolling ----

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_y
    }

    pub fn max_scroll_offset(&self) -> f32 {
        self.max_scroll_y
    }

    pub fn horizontal_scroll_offset(&self) -> f32 {
        self.scroll_x
    }

    pub fn scroll_info(&self) -> ScrollInfo {
        ScrollInfo {
            scrollable: self.scrollable,
            offset: self.scroll_y,
            max_offset: self.max_scroll_y,
            percentage: if self.max_scroll_y > 0.0 {
                self.scroll_y / self.max_scroll_y * 100.0
            } else {
                0.0
            },
        }
    }

    /// Returns `true` if the offset moved.
    pub fn scroll_by(&mut self, delta: f32) -> bool {
        if !self.scrollable {
            return false;
        }
        let old = self.scroll_y;
        self.scroll_y = (self.scroll_y + delta).clamp(0.0, self.max_scroll_y);
        self.scroll_y != old
    }

    fn scroll_horizontally_by(&mut self, delta: f32) -> bool {
        let old = self.scroll_x;
        self.scroll_x = (self.scroll_x + delta).clamp(0.0, self.max_scroll_x);
        self.scroll_x != old
    }

    pub fn scroll_to_top(&mut self) {
        if self.scrollable {
            self.scroll_y = 0.0;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        if self.scrollable {
            self.scroll_y = self.max_scroll_y;
        }
    }

    pub fn scroll_to_cursor(&mut self) {
        self.refresh();
        self.ensure_cursor_visible();
    }

    fn scroll_to_line(&mut self, display_row: usize) {
        if !self.scrollable {
            return;
        }
        let lh = self.line_height();
        let top = display_row as f32 * lh;
        let visible = self.content_rect().height;
        if top < self.scroll_y {
            self.scroll_y = top;
        } else if top + lh > self.scroll_y + visible {
            self.scroll_y = top + lh - visible;
        }
        self.scroll_y = self.scroll_y.clamp(0.0, self.max_scroll_y);
    }

    fn ensure_cursor_visible(&mut self) {
        if self.buffer.multiline() {
            let (row, _) = self.wrap.to_display(self.buffer.cursor());
            self.scroll_to_line(row);
            return;
        }
        if self.max_scroll_x <= 0.0 {
            return;
        }
        let cursor = self.buffer.cursor();
        let prefix = buffer::char_slice(self.buffer.line(0), 0, cursor.col).to_string();
        let x = self.text_width(&prefix);
        let avail = self.usable_width();
        let margin = self.config.scroll_margin;
        let on_screen = x - self.scroll_x;
        if on_screen < margin {
            self.scroll_x = (x - margin).max(0.0);
        } else if on_screen > avail - margin {
            self.scroll_x = (x - avail + margin).min(self.max_scroll_x);
        }
    }

    // ---- caret ----

    fn reset_caret_blink(&mut self) {
        self.blink_start = Instant::now();
        self.caret_shown = true;
    }

    fn caret_visible(&self) -> bool {
        let period = Duration::from_millis(self.config.blink_interval_ms.max(1));
        (self.blink_start.elapsed().as_millis() / period.as_millis()) % 2 == 0
    }

    // ---- hit-testing ----

    /// Logical position under a point in UI coordinates.
    pub fn position_at(&mut self, x: f32, y: f32) -> TextPosition {
        self.refresh();
        let c = self.content_rect();
        let fs = self.base.style.font_size;
        let click_x = (x - c.x).clamp(-CLICK_TOLERANCE, c.width + CLICK_TOLERANCE);

        if !self.buffer.multiline() {
            let positions = self.measure.caret_positions(self.buffer.line(0), fs);
            return TextPosition::new(0, nearest_caret(&positions, click_x + self.scroll_x));
        }

        let lh = self.line_height();
        let click_y = (y - c.y).clamp(-CLICK_TOLERANCE, c.height + CLICK_TOLERANCE);
        let k = (((c.height + self.scroll_y - click_y) / lh).ceil() - 1.0).max(0.0) as usize;
        if k >= self.wrap.display_line_count() {
            return self.buffer.end_position();
        }
        let (row, seg_idx) = self.wrap.locate(k);
        let Some(seg) = self.wrap.segments(row).get(seg_idx) else {
            return TextPosition::new(row, 0);
        };
        let positions = self.measure.caret_positions(&seg.text, fs);
        TextPosition::new(row, seg.start + nearest_caret(&positions, click_x))
    }

    // ---- editing ----

    /// Applies `f` and records it for undo. Returns `true` if the text
    /// changed.
    fn edit(
        &mut self,
        kind: EditKind,
        ctx: Option<&mut EventCtx<'_>>,
        f: impl FnOnce(&mut TextBuffer),
    ) -> bool {
        let before = self.buffer.snapshot();
        let revision = self.buffer.revision();
        f(&mut self.buffer);
        if self.buffer.revision() == revision {
            return false;
        }
        self.history.record(before, self.buffer.snapshot(), kind);
        self.changed(ctx);
        true
    }

    fn step_history(&mut self, undo: bool, ctx: Option<&mut EventCtx<'_>>) -> bool {
        let snapshot = if undo {
            self.history.undo()
        } else {
            self.history.redo()
        };
        let Some(snapshot) = snapshot.cloned() else {
            return false;
        };
        self.buffer.restore(&snapshot);
        self.changed(ctx);
        true
    }

    fn changed(&mut self, ctx: Option<&mut EventCtx<'_>>) {
        self.buffer.validate();
        self.refresh();
        self.ensure_cursor_visible();
        self.reset_caret_blink();
        let text = self.buffer.text();
        if let Some(cb) = self.on_change.clone() {
            cb(&text);
        }
        if let Some(ctx) = ctx {
            ctx.emit(UiEvent::value_changed(text));
            ctx.request_redraw();
        }
    }

    fn submit(&mut self) {
        let text = self.buffer.text();
        if text.trim().is_empty() {
            log::debug!("submit ignored: no text");
            return;
        }
        if let Some(cb) = self.on_submit.clone() {
            cb(&text);
        }
    }

    fn run(&mut self, command: EditCommand, ctx: &mut EventCtx<'_>) {
        match command {
            EditCommand::Move { motion, extend } => {
                let page = self.lines_per_page();
                self.history.close_burst();
                self.buffer.move_cursor(motion, extend, page);
                self.ensure_cursor_visible();
                self.reset_caret_blink();
                ctx.request_redraw();
            }
            EditCommand::Backspace => {
                self.edit(EditKind::Deleting, Some(ctx), |b| {
                    b.backspace();
                });
            }
            EditCommand::Delete => {
                self.edit(EditKind::Deleting, Some(ctx), |b| {
                    b.delete();
                });
            }
            EditCommand::Submit => self.submit(),
            EditCommand::Newline => {
                if self.buffer.multiline() {
                    self.edit(EditKind::Other, Some(ctx), |b| {
                        b.newline();
                    });
                } else {
                    self.submit();
                }
            }
            EditCommand::SelectAll => {
                self.history.close_burst();
                self.buffer.select_all();
                ctx.request_redraw();
            }
            EditCommand::Copy => {
                let text = self
                    .buffer
                    .selected_text()
                    .unwrap_or_else(|| self.buffer.text());
                ctx.clipboard.set_clipboard_text(&text);
            }
            EditCommand::Cut => {
                if let Some(text) = self.buffer.selected_text() {
                    ctx.clipboard.set_clipboard_text(&text);
                    self.edit(EditKind::Other, Some(ctx), |b| {
                        b.delete_selection();
                    });
                }
            }
            EditCommand::Paste => {
                let text = ctx.clipboard.get_clipboard_text();
                if !text.is_empty() {
                    self.edit(EditKind::Other, Some(ctx), |b| b.insert(&text));
                }
            }
            EditCommand::Undo => {
                self.step_history(true, Some(ctx));
            }
            EditCommand::Redo => {
                self.step_history(false, Some(ctx));
            }
            EditCommand::ReleaseFocus => ctx.release_focus(),
            EditCommand::Block => {}
        }
    }

    fn on_key(&mut self, combo: &KeyCombo, ctx: &mut EventCtx<'_>) -> bool {
        match self.keymap.lookup(combo) {
            Some(command) => self.run(command, ctx),
            None => log::trace!("unbound key {} swallowed by text input", combo),
        }
        true
    }

    fn on_text(&mut self, text: &str, ctx: &mut EventCtx<'_>) -> bool {
        let text: String = text
            .chars()
            .filter(|c| !c.is_control() || *c == '\n')
            .collect();
        if text.is_empty() {
            return true;
        }
        self.edit(EditKind::Typing, Some(ctx), |b| b.insert(&text));
        true
    }

    // ---- pointer ----

    fn on_press(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        if !self.base.bounds.contains(event.position) {
            return false;
        }
        let pos = self.position_at(event.x(), event.y());
        self.history.close_burst();
        self.buffer.move_to(pos, false);
        self.drag = Some(DragState {
            anchor: pos,
            origin: event.position,
            pointer: event.position,
            moved: false,
        });
        self.ensure_cursor_visible();
        self.reset_caret_blink();
        ctx.focus_target();
        ctx.request_redraw();
        true
    }

    fn on_drag(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        let Some(mut drag) = self.drag else {
            return false;
        };
        let t = self.config.drag_threshold;
        if (event.x() - drag.origin.x).abs() > t || (event.y() - drag.origin.y).abs() > t {
            drag.moved = true;
        }
        drag.pointer = event.position;
        self.drag = Some(drag);
        self.autoscroll(drag.pointer);
        let pos = self.position_at(event.x(), event.y());
        self.buffer.select(drag.anchor, pos);
        ctx.request_redraw();
        true
    }

    fn on_release(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let pos = self.position_at(event.x(), event.y());
        self.buffer.select(drag.anchor, pos);
        if !drag.moved && drag.anchor == pos {
            self.buffer.clear_selection();
        }
        ctx.request_redraw();
        true
    }

    fn on_wheel(&mut self, event: &UiEvent) -> bool {
        let delta = event.wheel_delta() * self.config.wheel_sensitivity;
        if delta == 0.0 {
            return false;
        }
        if self.buffer.multiline() {
            self.scrollable && {
                self.scroll_by(delta);
                true
            }
        } else if self.max_scroll_x > 0.0 {
            self.scroll_horizontally_by(delta);
            true
        } else {
            false
        }
    }

    /// Scrolls one step toward the edge the pointer is near. Returns `true`
    /// when the view moved.
    fn autoscroll(&mut self, pointer: Vec2) -> bool {
        let c = self.content_rect();
        let margin = self.config.scroll_margin;
        let speed = self.config.scroll_speed;
        if self.buffer.multiline() {
            if !self.scrollable {
                return false;
            }
            let rel = pointer.y - c.y;
            if rel < margin {
                self.scroll_by(speed)
            } else if rel > c.height - margin {
                self.scroll_by(-speed)
            } else {
                false
            }
        } else {
            if self.max_scroll_x <= 0.0 {
                return false;
            }
            let rel = pointer.x - c.x;
            if rel < margin {
                self.scroll_horizontally_by(-speed)
            } else if rel > c.width - margin {
                self.scroll_horizontally_by(speed)
            } else {
                false
            }
        }
    }

    // ---- drawing ----

    fn visible_rows(&self) -> std::ops::Range<usize> {
        let total = self.wrap.display_line_count();
        if !self.buffer.multiline() {
            return 0..total.min(1);
        }
        let lh = self.line_height();
        let c = self.content_rect();
        let first = (self.scroll_y / lh).floor() as usize;
        let last = ((self.scroll_y + c.height) / lh).ceil() as usize;
        first.min(total)..last.min(total)
    }

    fn draw_selection(&mut self, r: &mut Renderer, sel: Selection, c: Bounds) {
        let lh = self.line_height();
        let color = self.base.style.selection;
        let (start_row, start_col) = self.wrap.to_display(sel.start);
        let (end_row, end_col) = self.wrap.to_display(sel.end);
        let rows = self.visible_rows();
        for k in rows.start.max(start_row)..rows.end.min(end_row + 1) {
            let (row, seg_idx) = self.wrap.locate(k);
            let Some(seg) = self.wrap.segments(row).get(seg_idx).cloned() else {
                continue;
            };
            let from = if k == start_row { start_col } else { 0 };
            let to = if k == end_row { end_col } else { seg.len() };
            let x0 = self.text_width(buffer::char_slice(&seg.text, 0, from));
            let x1 = self.text_width(buffer::char_slice(&seg.text, 0, to));
            let y = self.row_y(k);
            let x = c.x + x0 - self.scroll_x;
            r.draw_rect(Bounds::new(x, y, (x1 - x0).max(1.0), lh), color);
        }
    }

    fn draw_lines(&mut self, r: &mut Renderer, c: Bounds) {
        let fs = self.base.style.font_size;
        let color = self.base.style.text_for(self.base.interaction());
        let lh = self.line_height();
        let rows = self.visible_rows();
        for k in rows {
            let (row, seg_idx) = self.wrap.locate(k);
            let Some(seg) = self.wrap.segments(row).get(seg_idx) else {
                continue;
            };
            if seg.text.trim().is_empty() {
                continue;
            }
            let y = self.row_y(k) + (lh - fs) / 2.0;
            r.draw_text(&seg.text, c.x - self.scroll_x, y, fs, color);
        }
    }

    fn draw_placeholder(&mut self, r: &mut Renderer, c: Bounds) {
        if self.config.placeholder.is_empty() {
            return;
        }
        let fs = self.base.style.font_size;
        let lh = self.line_height();
        let color = self.base.style.placeholder;
        let measure = self.measure.clone();
        let width = self.wrap_width();
        let segments = wrap_line(&self.config.placeholder, width, &mut |s| {
            measure.measure(s, fs).width
        });
        for (k, seg) in segments.iter().enumerate() {
            let y = self.row_y(k) + (lh - fs) / 2.0;
            if y + lh < c.y {
                break;
            }
            r.draw_text(&seg.text, c.x, y, fs, color);
        }
    }

    fn draw_caret(&mut self, r: &mut Renderer, c: Bounds) {
        let lh = self.line_height();
        let (k, col) = self.wrap.to_display(self.buffer.cursor());
        let (row, seg_idx) = self.wrap.locate(k);
        let prefix = self
            .wrap
            .segments(row)
            .get(seg_idx)
            .map(|s| buffer::char_slice(&s.text, 0, col).to_string())
            .unwrap_or_default();
        let x = c.x + self.text_width(&prefix) - self.scroll_x;
        let y = self.row_y(k);
        if self.buffer.multiline() && (y + lh < c.y || y > c.top()) {
            return;
        }
        r.draw_rect(
            Bounds::new(x, y + 1.0, 1.0, lh - 2.0),
            self.base.style.cursor,
        );
    }

    fn draw_scroll_indicator(&self, r: &mut Renderer, c: Bounds) {
        if !self.scrollable || self.max_scroll_y <= 0.0 {
            return;
        }
        let b = self.base.bounds;
        let x = b.right() - INDICATOR_WIDTH - 2.0;
        r.draw_rect(
            Bounds::new(x, c.y, INDICATOR_WIDTH, c.height),
            Color::from_f32(0.2, 0.2, 0.2, 0.3),
        );
        let total = c.height + self.max_scroll_y;
        let thumb = (c.height / total * c.height).max(MIN_THUMB).min(c.height);
        let ratio = self.scroll_y / self.max_scroll_y;
        let y = c.y + c.height - thumb - ratio * (c.height - thumb);
        r.draw_rect(
            Bounds::new(x, y, INDICATOR_WIDTH, thumb),
            Color::from_f32(0.5, 0.5, 0.5, 0.7),
        );
    }
}

impl Component for TextInput {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
        self.refresh();
        let b = self.base.bounds;
        let style = self.base.style;
        let focused = self.base.focused;
        let c = self.content_rect();

        let background = if !self.base.enabled {
            style.disabled_background
        } else if focused {
            style.focus_background
        } else {
            style.background
        };
        r.draw_rounded_rect(b, style.corner_radius, background);

        let clip = self.scrollable || self.max_scroll_x > 0.0;
        if clip {
            if self.buffer.multiline() {
                r.push_clip_rect(c);
            } else {
                r.push_clip_rect(Bounds::new(c.x, b.y, c.width, b.height));
            }
        }
        if let Some(sel) = self.buffer.selection() {
            self.draw_selection(r, sel, c);
        }
        if self.buffer.is_empty() {
            self.draw_placeholder(r, c);
        } else {
            self.draw_lines(r, c);
        }
        if focused && self.caret_visible() {
            self.draw_caret(r, c);
        }
        if clip {
            r.pop_clip_rect();
        }

        if style.border_width > 0.0 {
            let border = if focused {
                style.focus_border
            } else {
                style.border
            };
            r.draw_rounded_rect_outline(b, style.corner_radius, style.border_width, border);
        }
        self.draw_scroll_indicator(r, c);
        Ok(())
    }

    fn handle_event(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        if !self.base.visible || !self.base.enabled {
            return false;
        }
        if self.base.dispatch(event, ctx) {
            return true;
        }
        match event.event_type {
            EventType::Press => self.on_press(event, ctx),
            EventType::Drag => self.on_drag(event, ctx),
            EventType::Release => self.on_release(event, ctx),
            EventType::Wheel => self.on_wheel(event),
            EventType::KeyPress if self.base.focused => match event.key_combo() {
                Some(combo) => self.on_key(combo, ctx),
                None => false,
            },
            EventType::TextInput if self.base.focused => match event.text_payload() {
                Some(text) => self.on_text(text, ctx),
                None => false,
            },
            _ => false,
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.base.focused = focused;
        if focused {
            self.reset_caret_blink();
        } else {
            self.history.close_burst();
            self.drag = None;
        }
    }

    fn update_layout(&mut self) {
        self.refresh();
    }

    fn accepts_text_input(&self) -> bool {
        true
    }

    fn on_frame(&mut self) -> bool {
        let mut redraw = false;
        if let Some(drag) = self.drag.filter(|d| d.moved) {
            if self.autoscroll(drag.pointer) {
                let pos = self.position_at(drag.pointer.x, drag.pointer.y);
                self.buffer.select(drag.anchor, pos);
                redraw = true;
            }
        }
        if self.base.focused {
            let shown = self.caret_visible();
            if shown != self.caret_shown {
                self.caret_shown = shown;
                redraw = true;
            }
        }
        redraw
    }

    fn as_invalidatable(&mut self) -> Option<&mut dyn Invalidatable> {
        Some(self)
    }
}

impl Invalidatable for TextInput {
    fn invalidate(&mut self) {
        self.wrap.invalidate();
        self.refresh();
        self.ensure_cursor_visible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use vellum_core::headless::{DrawOp, MonospaceMeasure, RecordingSurface};
    use vellum_core::{Clipboard, ComponentId, MemoryClipboard, Size, UiRequest};

    const PX: f32 = 30.0;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// 400x200 box: content starts at (10, 10) and is 378x178; lines are
    /// 14 px tall and every char is 30 px wide.
    fn input(config: TextInputConfig) -> TextInput {
        let measure = Rc::new(MonospaceMeasure::fixed(PX, 11.0));
        let mut t = TextInput::with_config(Bounds::new(0.0, 0.0, 400.0, 200.0), config, measure);
        t.set_focused(true);
        t
    }

    fn single_line() -> TextInput {
        input(TextInputConfig {
            multiline: false,
            ..Default::default()
        })
    }

    fn key(t: &mut TextInput, clip: &mut MemoryClipboard, combo: &str) -> bool {
        let mut ctx = EventCtx::new(clip, Size::new(800.0, 600.0));
        t.handle_event(&UiEvent::key(combo.parse().unwrap()), &mut ctx)
    }

    fn type_text(t: &mut TextInput, clip: &mut MemoryClipboard, text: &str) {
        let mut ctx = EventCtx::new(clip, Size::new(800.0, 600.0));
        t.handle_event(&UiEvent::text(text), &mut ctx);
    }

    fn pointer(t: &mut TextInput, kind: EventType, x: f32, y: f32) -> bool {
        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(800.0, 600.0));
        t.handle_event(&UiEvent::pointer(kind, x, y), &mut ctx)
    }

    #[test]
    fn test_geometry() {
        let t = input(TextInputConfig::default());
        assert_eq!(t.content_rect(), Bounds::new(10.0, 10.0, 378.0, 178.0));
        assert_eq!(t.line_height(), 14.0);
        assert_eq!(t.usable_width(), 370.0);
    }

    #[test]
    fn test_typing_emits_value_changed_and_undo_restores() {
        init_logging();
        let mut t = input(TextInputConfig::default());
        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = changes.clone();
        t.on_change(move |s| c.borrow_mut().push(s.to_string()));

        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(800.0, 600.0));
        t.handle_event(&UiEvent::text("hi"), &mut ctx);
        t.handle_event(&UiEvent::text(" there"), &mut ctx);
        assert_eq!(ctx.emitted().len(), 2);
        assert_eq!(ctx.emitted()[1].text_payload(), Some("hi there"));
        drop(ctx);

        assert!(key(&mut t, &mut clip, "CTRL_Z"));
        assert_eq!(t.text(), "");
        assert_eq!(t.cursor(), TextPosition::ORIGIN);
        assert!(key(&mut t, &mut clip, "CTRL_SHIFT_Z"));
        assert_eq!(t.text(), "hi there");
        assert_eq!(
            changes.borrow().last().map(String::as_str),
            Some("hi there")
        );
    }

    #[test]
    fn test_every_key_is_consumed_while_focused() {
        let mut t = input(TextInputConfig::default());
        let mut clip = MemoryClipboard::default();
        assert!(key(&mut t, &mut clip, "A"));
        assert!(key(&mut t, &mut clip, "F5"));
        t.set_focused(false);
        assert!(!key(&mut t, &mut clip, "A"));
    }

    #[test]
    fn test_clipboard_commands() {
        let mut t = input(TextInputConfig::default());
        let mut clip = MemoryClipboard::default();
        t.set_text("hello world");

        // Copy without a selection takes everything.
        key(&mut t, &mut clip, "CTRL_C");
        assert_eq!(clip.get_clipboard_text(), "hello world");

        // Cut without a selection does nothing.
        clip.set_clipboard_text("");
        key(&mut t, &mut clip, "CTRL_X");
        assert_eq!(t.text(), "hello world");

        key(&mut t, &mut clip, "CTRL_END");
        for _ in 0..5 {
            key(&mut t, &mut clip, "SHIFT_LEFT_ARROW");
        }
        key(&mut t, &mut clip, "CTRL_X");
        assert_eq!(clip.get_clipboard_text(), "world");
        assert_eq!(t.text(), "hello ");

        key(&mut t, &mut clip, "CTRL_A");
        clip.set_clipboard_text("line one\nline two");
        key(&mut t, &mut clip, "CTRL_V");
        assert_eq!(t.text(), "line one\nline two");
    }

    #[test]
    fn test_single_line_paste_and_enter() {
        let mut t = single_line();
        let submitted = Rc::new(RefCell::new(None));
        let s = submitted.clone();
        t.on_submit(move |text| *s.borrow_mut() = Some(text.to_string()));

        let mut clip = MemoryClipboard::default();
        clip.set_clipboard_text("a\nb");
        key(&mut t, &mut clip, "CTRL_V");
        assert_eq!(t.text(), "a b");

        key(&mut t, &mut clip, "SHIFT_RET");
        assert_eq!(t.text(), "a b");
        assert_eq!(submitted.borrow().as_deref(), Some("a b"));
    }

    #[test]
    fn test_submit_ignores_blank_text() {
        let mut t = input(TextInputConfig::default());
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        t.on_submit(move |_| *c.borrow_mut() += 1);
        let mut clip = MemoryClipboard::default();
        type_text(&mut t, &mut clip, "   ");
        key(&mut t, &mut clip, "RET");
        assert_eq!(*count.borrow(), 0);
        key(&mut t, &mut clip, "SHIFT_RET");
        assert_eq!(t.buffer().line_count(), 2);
    }

    #[test]
    fn test_escape_requests_focus_release() {
        let mut t = input(TextInputConfig::default());
        let mut clip = MemoryClipboard::default();
        let id = ComponentId::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(800.0, 600.0)).with_target(id);
        assert!(t.handle_event(&UiEvent::key(KeyCombo::plain("ESC")), &mut ctx));
        assert_eq!(ctx.requests(), &[UiRequest::ReleaseFocus(id)]);
    }

    #[test]
    fn test_click_places_cursor_single_line() {
        let mut t = single_line();
        t.set_text("abcdef");
        // Caret stops at 10, 40, 70, 100, ...; 105 is nearest to col 3.
        assert!(pointer(&mut t, EventType::Press, 105.0, 100.0));
        assert!(pointer(&mut t, EventType::Release, 105.0, 100.0));
        assert_eq!(t.cursor(), TextPosition::new(0, 3));
        assert_eq!(t.selection(), None);
    }

    #[test]
    fn test_drag_selects_range() {
        let mut t = single_line();
        t.set_text("abcdef");
        pointer(&mut t, EventType::Press, 40.0, 100.0);
        pointer(&mut t, EventType::Drag, 130.0, 100.0);
        pointer(&mut t, EventType::Release, 130.0, 100.0);
        assert_eq!(t.selected_text().as_deref(), Some("bcd"));
        assert_eq!(t.cursor(), TextPosition::new(0, 4));
    }

    #[test]
    fn test_click_in_wrapped_text_uses_display_rows() {
        let mut t = input(TextInputConfig::default());
        t.set_text("hello world foobar");
        assert_eq!(t.display_line_count(), 2);
        // Second display row spans y in [160, 174); "foobar" starts at col 12.
        pointer(&mut t, EventType::Press, 10.0 + 2.0 * PX, 165.0);
        assert_eq!(t.cursor(), TextPosition::new(0, 14));
        // Below the last row resolves to the end of the text.
        pointer(&mut t, EventType::Press, 50.0, 20.0);
        assert_eq!(t.cursor(), TextPosition::new(0, 18));
    }

    #[test]
    fn test_wheel_and_cursor_scrolling_stay_in_range() {
        let mut t = input(TextInputConfig::default());
        let text = vec!["x"; 30].join("\n");
        t.set_text(&text);
        // 30 rows of 14 px in a 178 px viewport.
        assert!(t.is_scrollable());
        assert_eq!(t.max_scroll_offset(), 242.0);

        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(800.0, 600.0));
        assert!(t.handle_event(&UiEvent::wheel(50.0, 50.0, 100.0), &mut ctx));
        assert_eq!(t.scroll_offset(), 242.0);
        t.handle_event(&UiEvent::wheel(50.0, 50.0, -100.0), &mut ctx);
        assert_eq!(t.scroll_offset(), 0.0);
        drop(ctx);

        key(&mut t, &mut clip, "CTRL_END");
        assert_eq!(t.scroll_offset(), 242.0);
        key(&mut t, &mut clip, "CTRL_HOME");
        assert_eq!(t.scroll_offset(), 0.0);
        key(&mut t, &mut clip, "PAGE_DOWN");
        assert_eq!(t.cursor().row, 12);
        // Row 12 ends 182 px down; the 178 px viewport scrolls by 4.
        assert_eq!(t.scroll_offset(), 4.0);
    }

    #[test]
    fn test_zero_font_size_pages_the_right_way() {
        let mut t = input(TextInputConfig::default());
        t.base_mut().style.font_size = 0.0;
        assert_eq!(t.line_height(), 1.0);
        t.set_text("a\nb\nc\nd");
        let mut clip = MemoryClipboard::default();
        key(&mut t, &mut clip, "CTRL_END");
        assert_eq!(t.cursor().row, 3);
        key(&mut t, &mut clip, "PAGE_UP");
        assert_eq!(t.cursor().row, 0);
        key(&mut t, &mut clip, "PAGE_DOWN");
        assert_eq!(t.cursor().row, 3);
    }

    #[test]
    fn test_auto_resize_grows_then_scrolls() {
        let mut t = input(TextInputConfig {
            auto_resize: true,
            max_height: 100.0,
            ..Default::default()
        });
        t.set_text("");
        assert_eq!(t.base().bounds.height, 60.0);

        t.set_text("a\nb\nc");
        // 3 rows + 22 px chrome + 0.6 row of slack.
        assert!((t.base().bounds.height - 72.4).abs() < 1e-3);
        assert!(!t.is_scrollable());

        t.set_text(&vec!["x"; 10].join("\n"));
        assert_eq!(t.base().bounds.height, 100.0);
        assert!(t.is_scrollable());
        assert_eq!(t.max_scroll_offset(), 140.0 - 78.0);
    }

    #[test]
    fn test_focus_loss_closes_typing_burst() {
        let mut t = input(TextInputConfig::default());
        let mut clip = MemoryClipboard::default();
        type_text(&mut t, &mut clip, "ab");
        t.set_focused(false);
        t.set_focused(true);
        type_text(&mut t, &mut clip, "cd");
        assert!(t.undo());
        assert_eq!(t.text(), "ab");
    }

    #[test]
    fn test_render_draws_wrapped_rows_and_placeholder() {
        let mut t = input(TextInputConfig {
            placeholder: "Type here".into(),
            ..Default::default()
        });
        let surface = RecordingSurface::new();
        let ops = surface.ops();
        let mut renderer = Renderer::new(Box::new(surface));

        t.render(&mut renderer).unwrap();
        assert!(
            ops.borrow()
                .iter()
                .any(|op| matches!(op, DrawOp::Text(s, _, _) if s == "Type here"))
        );

        ops.borrow_mut().clear();
        t.set_text("hello world foobar");
        t.render(&mut renderer).unwrap();
        let texts: Vec<String> = ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text(s, _, _) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["hello world", "foobar"]);
    }

    #[test]
    fn test_config_from_partial_json() {
        let cfg: TextInputConfig = serde_json::from_str(
            r#"{"multiline": false, "placeholder": "Say something", "max_height": 300}"#,
        )
        .unwrap();
        assert!(!cfg.multiline);
        assert_eq!(cfg.placeholder, "Say something");
        assert_eq!(cfg.max_height, 300.0);
        assert_eq!(cfg.min_height, 60.0);
        assert_eq!(cfg.history_capacity, 500);
    }
}
