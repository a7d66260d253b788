//! # Scroll view
//!
//! A [`ScrollView`] owns children laid out in *content space* and shows a
//! window onto them. Content bounds are the union of the children's bounds;
//! the scroll range on each axis is `max(0, content − visible)`.
//!
//! Two vertical conventions are supported:
//!
//! - normal (y up): content y = 0 sits at the bottom of the view when
//!   `scroll_y == 0`, so "top" is `scroll_y == max`,
//! - reverse (`reverse_y`): content is laid out top-down from the view's top
//!   edge, so "top" is `scroll_y == 0`.
//!
//! The geometry helpers below are free functions so the thumb position and
//! the thumb-drag inverse can be checked on their own.
//!
//! ```rust
//! use vellum_core::*;
//! use vellum_ui::{Label, ScrollView};
//!
//! let mut view = ScrollView::new(Bounds::new(0.0, 0.0, 200.0, 400.0));
//! view.add_child(Label::new(Bounds::new(0.0, 0.0, 180.0, 1000.0), "tall"));
//! assert_eq!(view.max_scroll().1, 600.0);
//! view.scroll_by(0.0, 5000.0);
//! assert_eq!(view.scroll_offset().1, 600.0);
//! ```

use serde::{Deserialize, Serialize};

use vellum_core::{
    Bounds, Cleanable, Component, ComponentBase, CursorType, EventCtx, EventType, Invalidatable,
    Renderer, ThemeSource, UiEvent, Vec2,
};

use crate::container::ChildList;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    #[default]
    Vertical,
    Horizontal,
    Both,
}

impl ScrollDirection {
    pub fn vertical(self) -> bool {
        matches!(self, ScrollDirection::Vertical | ScrollDirection::Both)
    }

    pub fn horizontal(self) -> bool {
        matches!(self, ScrollDirection::Horizontal | ScrollDirection::Both)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub direction: ScrollDirection,
    pub show_scrollbars: bool,
    pub scrollbar_width: f32,
    pub min_thumb: f32,
    /// Pixels per wheel notch.
    pub scroll_speed: f32,
    pub reverse_y: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            direction: ScrollDirection::Vertical,
            show_scrollbars: true,
            scrollbar_width: 12.0,
            min_thumb: 20.0,
            scroll_speed: 30.0,
            reverse_y: false,
        }
    }
}

/// `max(0, content − visible)`.
pub fn max_scroll(content: f32, visible: f32) -> f32 {
    (content - visible).max(0.0)
}

/// Thumb length for a track, never shorter than `min_thumb` nor longer than
/// the track.
pub fn thumb_length(track: f32, visible: f32, content: f32, min_thumb: f32) -> f32 {
    if content <= 0.0 {
        return track;
    }
    (track * (visible / content)).max(min_thumb).min(track)
}

/// Distance of the thumb from the track start for `offset` in `[0, max]`.
pub fn thumb_offset(offset: f32, max: f32, track: f32, thumb: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    (offset / max).clamp(0.0, 1.0) * (track - thumb).max(0.0)
}

/// Offset after dragging the thumb by `delta` pixels from where it was when
/// the offset was `start`. Inverse of [`thumb_offset`].
pub fn offset_from_thumb_drag(start: f32, delta: f32, max: f32, track: f32, thumb: f32) -> f32 {
    let travel = track - thumb;
    if travel <= 0.0 {
        return start.clamp(0.0, max);
    }
    (start + delta / travel * max).clamp(0.0, max)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug)]
struct ThumbDrag {
    axis: Axis,
    pointer_start: f32,
    offset_start: f32,
}

pub struct ScrollView {
    base: ComponentBase,
    config: ScrollConfig,
    children: ChildList,
    content: Bounds,
    scroll_x: f32,
    scroll_y: f32,
    max_x: f32,
    max_y: f32,
    drag: Option<ThumbDrag>,
}

impl ScrollView {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_config(bounds, ScrollConfig::default())
    }

    pub fn with_config(bounds: Bounds, config: ScrollConfig) -> Self {
        let mut view = Self {
            base: ComponentBase::new(bounds),
            config,
            children: ChildList::new(),
            content: Bounds::from_size(bounds.size()),
            scroll_x: 0.0,
            scroll_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            drag: None,
        };
        view.update_content_bounds();
        view
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ScrollConfig) {
        self.config = config;
        self.update_content_bounds();
    }

    // ---- children ----

    /// Adds a child positioned in content space. Returns its index.
    pub fn add_child(&mut self, child: impl Component) -> usize {
        self.add_boxed(Box::new(child))
    }

    pub fn add_boxed(&mut self, child: Box<dyn Component>) -> usize {
        let index = self.children.push(child);
        self.update_content_bounds();
        index
    }

    /// Removes a child, running its cleanup first.
    pub fn remove_child(&mut self, index: usize) -> Option<Box<dyn Component>> {
        let child = self.children.remove(index);
        if child.is_some() {
            self.update_content_bounds();
        }
        child
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
        self.update_content_bounds();
    }

    pub fn children(&self) -> &ChildList {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut ChildList {
        &mut self.children
    }

    /// Recomputes content bounds and limits after children moved or
    /// resized.
    pub fn update_content_bounds(&mut self) {
        let b = self.base.bounds;
        self.content = {
            let mut it = self.children.iter().map(|c| c.base().bounds);
            match it.next() {
                None => Bounds::from_size(b.size()),
                Some(first) => {
                    let u = it.fold(first, |acc, r| acc.union(&r));
                    if self.config.reverse_y {
                        Bounds::new(u.x, 0.0, u.width, u.top())
                    } else {
                        u
                    }
                }
            }
        };
        self.update_limits();
        log::debug!(
            "scroll view content {:?}, max ({}, {})",
            self.content,
            self.max_x,
            self.max_y
        );
    }

    fn update_limits(&mut self) {
        let b = self.base.bounds;
        if self.children.is_empty() {
            self.max_x = 0.0;
            self.max_y = 0.0;
        } else {
            let mut avail_w = b.width;
            let mut avail_h = b.height;
            if self.config.show_scrollbars {
                let dir = self.config.direction;
                if dir.vertical() && max_scroll(self.content.height, b.height) > 0.0 {
                    avail_w -= self.config.scrollbar_width;
                }
                if dir.horizontal() && max_scroll(self.content.width, b.width) > 0.0 {
                    avail_h -= self.config.scrollbar_width;
                }
            }
            self.max_x = max_scroll(self.content.width, avail_w);
            self.max_y = max_scroll(self.content.height, avail_h);
        }
        self.scroll_x = self.scroll_x.clamp(0.0, self.max_x);
        self.scroll_y = self.scroll_y.clamp(0.0, self.max_y);
    }

    pub fn content_bounds(&self) -> Bounds {
        self.content
    }

    // ---- scrolling ----

    pub fn scroll_offset(&self) -> (f32, f32) {
        (self.scroll_x, self.scroll_y)
    }

    pub fn max_scroll(&self) -> (f32, f32) {
        (self.max_x, self.max_y)
    }

    pub fn scroll_to(&mut self, x: Option<f32>, y: Option<f32>) {
        if let Some(x) = x {
            self.scroll_x = x.clamp(0.0, self.max_x);
        }
        if let Some(y) = y {
            self.scroll_y = y.clamp(0.0, self.max_y);
        }
    }

    /// Returns `true` if either offset moved.
    pub fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        let before = (self.scroll_x, self.scroll_y);
        self.scroll_to(Some(self.scroll_x + dx), Some(self.scroll_y + dy));
        before != (self.scroll_x, self.scroll_y)
    }

    pub fn scroll_to_top(&mut self) {
        let y = if self.config.reverse_y {
            0.0
        } else {
            self.max_y
        };
        self.scroll_to(None, Some(y));
    }

    pub fn scroll_to_bottom(&mut self) {
        let y = if self.config.reverse_y {
            self.max_y
        } else {
            0.0
        };
        self.scroll_to(None, Some(y));
    }

    /// Scrolls the least distance that brings child `index` into view.
    pub fn scroll_to_child(&mut self, index: usize) {
        let Some(child) = self.children.get(index) else {
            return;
        };
        let c = child.base().bounds;
        let b = self.base.bounds;
        if self.config.reverse_y {
            if c.y < self.scroll_y {
                self.scroll_y = c.y;
            } else if c.top() > self.scroll_y + b.height {
                self.scroll_y = c.top() - b.height;
            }
        } else {
            let left = c.x - self.scroll_x;
            let right = c.right() - self.scroll_x;
            if left < 0.0 {
                self.scroll_x += left;
            } else if right > b.width {
                self.scroll_x += right - b.width;
            }
            let bottom = c.y - self.scroll_y;
            let top = c.top() - self.scroll_y;
            if bottom < 0.0 {
                self.scroll_y += bottom;
            } else if top > b.height {
                self.scroll_y += top - b.height;
            }
        }
        self.scroll_to(Some(self.scroll_x), Some(self.scroll_y));
    }

    /// Viewport size after scrollbars, in screen space.
    fn viewport(&self) -> Bounds {
        let b = self.base.bounds;
        let mut w = b.width;
        let mut h = b.height;
        if self.config.show_scrollbars {
            if self.config.direction.vertical() && self.max_y > 0.0 {
                w -= self.config.scrollbar_width;
            }
            if self.config.direction.horizontal() && self.max_x > 0.0 {
                h -= self.config.scrollbar_width;
            }
        }
        Bounds::new(b.x, b.y, w.max(0.0), h.max(0.0))
    }

    /// The window onto content space that is currently shown.
    pub fn visible_bounds(&self) -> Bounds {
        let v = self.viewport();
        Bounds::new(v.x + self.scroll_x, v.y + self.scroll_y, v.width, v.height)
    }

    /// Screen position of a child's bottom-left corner.
    fn child_screen_origin(&self, child: Bounds) -> Vec2 {
        let b = self.base.bounds;
        let x = b.x + child.x - self.scroll_x;
        let y = if self.config.reverse_y {
            b.y + b.height - child.y - child.height + self.scroll_y
        } else {
            b.y + child.y - self.scroll_y
        };
        Vec2::new(x, y)
    }

    /// Maps a screen event into content space.
    fn to_content(&self, event: &UiEvent) -> UiEvent {
        let b = self.base.bounds;
        let x = event.x() - b.x + self.scroll_x;
        let y = if self.config.reverse_y {
            b.height - (event.y() - b.y) + self.scroll_y
        } else {
            event.y() - b.y + self.scroll_y
        };
        UiEvent {
            position: Vec2::new(x, y),
            ..event.clone()
        }
    }

    // ---- scrollbars ----

    fn vertical_track(&self) -> Bounds {
        let b = self.base.bounds;
        let w = self.config.scrollbar_width;
        let reserve = if self.config.direction == ScrollDirection::Both {
            w
        } else {
            0.0
        };
        Bounds::new(b.right() - w, b.y + reserve, w, b.height - reserve)
    }

    fn horizontal_track(&self) -> Bounds {
        let b = self.base.bounds;
        let w = self.config.scrollbar_width;
        let reserve = if self.config.direction == ScrollDirection::Both {
            w
        } else {
            0.0
        };
        Bounds::new(b.x, b.y, b.width - reserve, w)
    }

    /// Vertical thumb rectangle, if the vertical scrollbar is shown.
    pub fn vertical_thumb(&self) -> Option<Bounds> {
        if !self.config.show_scrollbars || !self.config.direction.vertical() || self.max_y <= 0.0 {
            return None;
        }
        let track = self.vertical_track();
        let len = thumb_length(
            track.height,
            self.base.bounds.height,
            self.content.height,
            self.config.min_thumb,
        );
        let off = thumb_offset(self.scroll_y, self.max_y, track.height, len);
        let y = if self.config.reverse_y {
            track.top() - len - off
        } else {
            track.y + off
        };
        Some(Bounds::new(track.x, y, track.width, len))
    }

    pub fn horizontal_thumb(&self) -> Option<Bounds> {
        if !self.config.show_scrollbars || !self.config.direction.horizontal() || self.max_x <= 0.0
        {
            return None;
        }
        let track = self.horizontal_track();
        let len = thumb_length(
            track.width,
            self.base.bounds.width,
            self.content.width,
            self.config.min_thumb,
        );
        let off = thumb_offset(self.scroll_x, self.max_x, track.width, len);
        Some(Bounds::new(track.x + off, track.y, len, track.height))
    }

    fn begin_thumb_drag(&mut self, event: &UiEvent) -> bool {
        if self
            .vertical_thumb()
            .is_some_and(|t| t.contains(event.position))
        {
            self.drag = Some(ThumbDrag {
                axis: Axis::Y,
                pointer_start: event.y(),
                offset_start: self.scroll_y,
            });
            self.base.cursor = CursorType::ScrollY;
            return true;
        }
        if self
            .horizontal_thumb()
            .is_some_and(|t| t.contains(event.position))
        {
            self.drag = Some(ThumbDrag {
                axis: Axis::X,
                pointer_start: event.x(),
                offset_start: self.scroll_x,
            });
            self.base.cursor = CursorType::ScrollX;
            return true;
        }
        false
    }

    fn update_thumb_drag(&mut self, drag: ThumbDrag, event: &UiEvent) {
        match drag.axis {
            Axis::Y => {
                let Some(thumb) = self.vertical_thumb() else {
                    return;
                };
                let track = self.vertical_track().height;
                let mut delta = event.y() - drag.pointer_start;
                if self.config.reverse_y {
                    delta = -delta;
                }
                self.scroll_y = offset_from_thumb_drag(
                    drag.offset_start,
                    delta,
                    self.max_y,
                    track,
                    thumb.height,
                );
            }
            Axis::X => {
                let Some(thumb) = self.horizontal_thumb() else {
                    return;
                };
                let track = self.horizontal_track().width;
                let delta = event.x() - drag.pointer_start;
                self.scroll_x = offset_from_thumb_drag(
                    drag.offset_start,
                    delta,
                    self.max_x,
                    track,
                    thumb.width,
                );
            }
        }
    }

    fn on_wheel(&mut self, event: &UiEvent) -> bool {
        if !self.config.direction.vertical() || !self.base.bounds.contains(event.position) {
            return false;
        }
        let step = event.wheel_delta() * self.config.scroll_speed;
        let dy = if self.config.reverse_y { step } else { -step };
        let moved = self.scroll_by(0.0, dy);
        if moved {
            log::trace!("scroll view wheel: y = {} of {}", self.scroll_y, self.max_y);
        }
        moved
    }

    fn update_hover_cursor(&mut self, event: &UiEvent) {
        if !self.config.show_scrollbars {
            return;
        }
        let over_v =
            self.config.direction.vertical() && self.vertical_track().contains(event.position);
        let over_h =
            self.config.direction.horizontal() && self.horizontal_track().contains(event.position);
        self.base.cursor = if over_v {
            CursorType::ScrollY
        } else if over_h {
            CursorType::ScrollX
        } else {
            CursorType::Default
        };
    }

    fn forward(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        let spatial = matches!(
            event.event_type,
            EventType::Press | EventType::Move | EventType::Wheel
        );
        if spatial && !self.viewport().contains(event.position) {
            return false;
        }
        let local = if event.event_type.is_pointer() {
            self.to_content(event)
        } else {
            event.clone()
        };
        self.children.dispatch(&local, ctx)
    }

    fn draw_scrollbars(&self, r: &mut Renderer) {
        let border = self.base.style.border;
        let track_color = border.scale_rgb(0.5).with_alpha(204);
        let thumb_color = border.scale_rgb(1.2).with_alpha(230);
        let active = self.base.style.focus_border;

        if let Some(thumb) = self.vertical_thumb() {
            r.draw_rect(self.vertical_track(), track_color);
            let dragging = self.drag.is_some_and(|d| d.axis == Axis::Y);
            r.draw_rect(thumb, if dragging { active } else { thumb_color });
        }
        if let Some(thumb) = self.horizontal_thumb() {
            r.draw_rect(self.horizontal_track(), track_color);
            let dragging = self.drag.is_some_and(|d| d.axis == Axis::X);
            r.draw_rect(thumb, if dragging { active } else { thumb_color });
        }
    }
}

impl Component for ScrollView {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
        let style = self.base.style;
        let b = self.base.bounds;
        r.draw_rect(b, style.background);
        if style.border_width > 0.0 {
            r.draw_rect_outline(b, style.border_width, style.border);
        }

        let viewport = self.viewport();
        r.push_clip_rect(viewport);
        for i in 0..self.children.len() {
            let Some(bounds) = self
                .children
                .get(i)
                .filter(|c| c.base().visible)
                .map(|c| c.base().bounds)
            else {
                continue;
            };
            let origin = self.child_screen_origin(bounds);
            let screen = Bounds::new(origin.x, origin.y, bounds.width, bounds.height);
            if !screen.intersects(&viewport) {
                continue;
            }
            let Some(child) = self.children.get_mut(i) else {
                continue;
            };
            child.base_mut().bounds = screen;
            ChildList::render_child(child, r);
            child.base_mut().bounds = bounds;
        }
        r.pop_clip_rect();

        if self.config.show_scrollbars {
            self.draw_scrollbars(r);
        }
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
            EventType::Press if self.begin_thumb_drag(event) => {
                ctx.request_redraw();
                return true;
            }
            EventType::Drag => {
                if let Some(drag) = self.drag {
                    self.update_thumb_drag(drag, event);
                    ctx.request_redraw();
                    return true;
                }
            }
            EventType::Release => {
                if self.drag.take().is_some() {
                    self.base.cursor = CursorType::Default;
                    ctx.request_redraw();
                    return true;
                }
            }
            EventType::Wheel => {
                if self.on_wheel(event) {
                    self.base.cursor = CursorType::ScrollY;
                    ctx.request_redraw();
                    return true;
                }
            }
            EventType::Move => self.update_hover_cursor(event),
            _ => {}
        }
        self.forward(event, ctx)
    }

    fn set_focused(&mut self, focused: bool) {
        self.base.focused = focused;
        if !focused {
            self.children.blur();
        }
    }

    fn update_layout(&mut self) {
        self.children.update_layout();
        self.update_content_bounds();
    }

    fn refresh_style(&mut self, theme: &dyn ThemeSource) {
        self.base.style.apply_theme(theme);
        self.children.refresh_style(theme);
    }

    fn accepts_text_input(&self) -> bool {
        self.children.accepts_text_input()
    }

    fn on_frame(&mut self) -> bool {
        self.children.on_frame()
    }

    fn as_cleanable(&mut self) -> Option<&mut dyn Cleanable> {
        Some(self)
    }

    fn as_invalidatable(&mut self) -> Option<&mut dyn Invalidatable> {
        Some(self)
    }
}

impl Cleanable for ScrollView {
    fn cleanup(&mut self) {
        self.clear_children();
    }
}

impl Invalidatable for ScrollView {
    fn invalidate(&mut self) {
        self.children.invalidate();
        self.update_content_bounds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Label;
    use vellum_core::headless::{DrawOp, RecordingSurface};
    use vellum_core::{MemoryClipboard, Size};

    fn tall_view(reverse_y: bool) -> ScrollView {
        let mut view = ScrollView::with_config(
            Bounds::new(0.0, 0.0, 200.0, 400.0),
            ScrollConfig {
                reverse_y,
                ..Default::default()
            },
        );
        view.add_child(Label::new(Bounds::new(0.0, 0.0, 180.0, 1000.0), "tall"));
        view
    }

    fn send(view: &mut ScrollView, event: UiEvent) -> bool {
        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(800.0, 600.0));
        view.handle_event(&event, &mut ctx)
    }

    #[test]
    fn test_limits_from_content() {
        assert_eq!(max_scroll(1000.0, 400.0), 600.0);
        assert_eq!(max_scroll(100.0, 400.0), 0.0);

        let view = tall_view(false);
        assert_eq!(view.content_bounds(), Bounds::new(0.0, 0.0, 180.0, 1000.0));
        assert_eq!(view.max_scroll(), (0.0, 600.0));

        let empty = ScrollView::new(Bounds::new(0.0, 0.0, 200.0, 400.0));
        assert_eq!(empty.max_scroll(), (0.0, 0.0));
    }

    #[test]
    fn test_cross_axis_shrinks_when_scrollbar_shown() {
        let mut view = ScrollView::with_config(
            Bounds::new(0.0, 0.0, 200.0, 400.0),
            ScrollConfig {
                direction: ScrollDirection::Both,
                ..Default::default()
            },
        );
        // Fits horizontally only until the vertical bar takes 12 px.
        view.add_child(Label::new(Bounds::new(0.0, 0.0, 195.0, 1000.0), "wide"));
        assert_eq!(view.max_scroll(), (7.0, 600.0));
    }

    #[test]
    fn test_wheel_clamps_to_range() {
        let mut view = tall_view(false);
        // Negative delta scrolls up in y-up content.
        assert!(send(&mut view, UiEvent::wheel(50.0, 50.0, -100.0)));
        assert_eq!(view.scroll_offset().1, 600.0);
        assert!(!send(&mut view, UiEvent::wheel(50.0, 50.0, -1.0)));
        assert!(send(&mut view, UiEvent::wheel(50.0, 50.0, 100.0)));
        assert_eq!(view.scroll_offset().1, 0.0);

        let mut reversed = tall_view(true);
        send(&mut reversed, UiEvent::wheel(50.0, 50.0, 1.0));
        assert_eq!(reversed.scroll_offset().1, 30.0);
    }

    #[test]
    fn test_top_and_bottom_follow_orientation() {
        let mut view = tall_view(false);
        view.scroll_to_top();
        assert_eq!(view.scroll_offset().1, 600.0);
        view.scroll_to_bottom();
        assert_eq!(view.scroll_offset().1, 0.0);

        let mut reversed = tall_view(true);
        reversed.scroll_to_bottom();
        assert_eq!(reversed.scroll_offset().1, 600.0);
        reversed.scroll_to_top();
        assert_eq!(reversed.scroll_offset().1, 0.0);
    }

    #[test]
    fn test_thumb_geometry_and_drag_are_inverse() {
        // track 400, visible 400, content 1000 -> thumb 160, travel 240
        assert_eq!(thumb_length(400.0, 400.0, 1000.0, 20.0), 160.0);
        assert_eq!(thumb_length(400.0, 4.0, 1000.0, 20.0), 20.0);
        assert_eq!(thumb_length(400.0, 800.0, 100.0, 20.0), 400.0);

        for offset in [0.0, 150.0, 300.0, 600.0] {
            let pos = thumb_offset(offset, 600.0, 400.0, 160.0);
            let back = offset_from_thumb_drag(0.0, pos, 600.0, 400.0, 160.0);
            assert!((back - offset).abs() < 1e-3, "{offset} -> {pos} -> {back}");
        }

        let mut view = tall_view(false);
        let thumb = view.vertical_thumb().unwrap();
        assert_eq!(thumb, Bounds::new(188.0, 0.0, 12.0, 160.0));
        let grab = thumb.center();
        assert!(send(
            &mut view,
            UiEvent::pointer(EventType::Press, grab.x, grab.y)
        ));
        send(
            &mut view,
            UiEvent::pointer(EventType::Drag, grab.x, grab.y + 120.0),
        );
        assert_eq!(view.scroll_offset().1, 300.0);
        assert_eq!(view.vertical_thumb().unwrap().y, 120.0);
        assert!(send(
            &mut view,
            UiEvent::pointer(EventType::Release, grab.x, grab.y + 120.0)
        ));
        assert!(view.drag.is_none());
    }

    #[test]
    fn test_reverse_thumb_starts_at_top() {
        let view = tall_view(true);
        let thumb = view.vertical_thumb().unwrap();
        assert_eq!(thumb.top(), 400.0);
    }

    #[test]
    fn test_scroll_to_child_and_visible_bounds() {
        let mut view = ScrollView::new(Bounds::new(0.0, 0.0, 200.0, 400.0));
        for i in 0..10 {
            view.add_child(Label::new(
                Bounds::new(0.0, i as f32 * 100.0, 150.0, 100.0),
                "row",
            ));
        }
        assert_eq!(view.max_scroll().1, 600.0);
        view.scroll_to_child(7);
        // Row 7 spans 700..800; its top must reach the viewport top.
        assert_eq!(view.scroll_offset().1, 400.0);
        assert_eq!(view.visible_bounds(), Bounds::new(0.0, 400.0, 188.0, 400.0));
        view.scroll_to_child(0);
        assert_eq!(view.scroll_offset().1, 0.0);

        assert!(view.remove_child(9).is_some());
        view.clear_children();
        assert_eq!(view.max_scroll(), (0.0, 0.0));
    }

    #[test]
    fn test_render_clips_and_offsets_children() {
        let mut view = tall_view(false);
        view.scroll_to(None, Some(100.0));
        let surface = RecordingSurface::new();
        let ops = surface.ops();
        let mut renderer = Renderer::new(Box::new(surface));
        view.render(&mut renderer).unwrap();
        assert_eq!(renderer.clip_depth(), 0);

        let ops = ops.borrow();
        assert!(ops.contains(&DrawOp::Scissor(Some(Bounds::new(0.0, 0.0, 188.0, 400.0)))));
        // The label is drawn shifted down by the scroll offset and put back.
        assert!(
            ops.iter().any(
                |op| matches!(op, DrawOp::Text(s, p, _) if s == "tall" && p.y < 1000.0 - 100.0)
            )
        );
        assert_eq!(
            view.children().get(0).unwrap().base().bounds,
            Bounds::new(0.0, 0.0, 180.0, 1000.0)
        );
    }

    #[test]
    fn test_events_reach_children_in_content_space() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut view = ScrollView::new(Bounds::new(100.0, 100.0, 200.0, 400.0));
        let mut label = Label::new(Bounds::new(0.0, 900.0, 180.0, 100.0), "last");
        let hits = Rc::new(Cell::new(Vec2::ZERO));
        let h = hits.clone();
        label
            .base_mut()
            .add_event_handler(EventType::Press, move |_, e, _| {
                h.set(e.position);
                Ok(true)
            });
        view.add_child(label);
        view.add_child(Label::new(Bounds::new(0.0, 0.0, 180.0, 100.0), "first"));
        view.scroll_to_top();
        assert_eq!(view.scroll_offset().1, 600.0);

        // Screen (150, 450) is content (50, 950).
        assert!(send(
            &mut view,
            UiEvent::pointer(EventType::Press, 150.0, 450.0)
        ));
        assert_eq!(hits.get(), Vec2::new(50.0, 950.0));
        // Over the scrollbar column nothing is forwarded.
        assert!(!send(
            &mut view,
            UiEvent::pointer(EventType::Press, 295.0, 150.0)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let cfg: ScrollConfig =
            serde_json::from_str(r#"{"direction": "both", "reverse_y": true}"#).unwrap();
        assert_eq!(cfg.direction, ScrollDirection::Both);
        assert!(cfg.reverse_y);
        assert_eq!(cfg.scrollbar_width, 12.0);
    }
}
