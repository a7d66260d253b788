//! Tabbed container: a strip of tab headers and one visible page.
//!
//! Every tab owns a content component. Pages live in a [`ChildList`] at the
//! same index as their tab; only the active page is visible, so pointer and
//! keyboard input can never reach a hidden one.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use vellum_core::{
    Bounds, Cleanable, Color, Component, ComponentBase, CursorType, EventCtx, EventType,
    Interaction, Invalidatable, Renderer, ThemeSource, UiEvent, Vec2,
};

use crate::container::ChildList;

const CLOSE_SIZE: f32 = 16.0;
const CLOSE_INSET: f32 = 5.0;
const BADGE_SIZE: f32 = 16.0;
const BADGE_FONT: f32 = 10.0;
const TITLE_INSET: f32 = 8.0;
const SIDE_BAR_MIN_WIDTH: f32 = 100.0;
const TAB_SCROLL_STEP: f32 = 20.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

impl TabPosition {
    fn horizontal(self) -> bool {
        matches!(self, TabPosition::Top | TabPosition::Bottom)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStyle {
    #[default]
    Standard,
    Rounded,
    Pill,
    Underline,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub tab_position: TabPosition,
    pub tab_style: TabStyle,
    pub tab_height: f32,
    pub tab_min_width: f32,
    pub tab_max_width: f32,
    /// Wheel over an overflowing strip scrolls it instead of switching tabs.
    pub scrollable_tabs: bool,
    pub show_close_buttons: bool,
    pub show_add_button: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            tab_position: TabPosition::Top,
            tab_style: TabStyle::Standard,
            tab_height: 35.0,
            tab_min_width: 80.0,
            tab_max_width: 200.0,
            scrollable_tabs: true,
            show_close_buttons: false,
            show_add_button: false,
        }
    }
}

/// Header data for one tab.
#[derive(Clone, Debug, PartialEq)]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub tooltip: String,
    pub badge: Option<String>,
    pub badge_color: Color,
    pub enabled: bool,
    pub visible: bool,
    pub closable: bool,
}

impl Tab {
    fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            tooltip: title.to_string(),
            badge: None,
            badge_color: Color::from_rgb(255, 0, 0),
            enabled: true,
            visible: true,
            closable: false,
        }
    }

    fn selectable(&self) -> bool {
        self.enabled && self.visible
    }
}

type TabCallback = Rc<dyn Fn(&str)>;

pub struct Navigator {
    base: ComponentBase,
    config: NavigatorConfig,
    tabs: Vec<Tab>,
    pages: ChildList,
    active: Option<usize>,
    hovered: Option<usize>,
    hovered_close: Option<usize>,
    tab_scroll: f32,
    max_tab_scroll: f32,
    tab_bar: Bounds,
    content: Bounds,
    add_button: Bounds,
    headers: Vec<Option<Bounds>>,
    close_buttons: Vec<Option<Bounds>>,
    on_tab_changed: Option<TabCallback>,
    on_tab_closed: Option<TabCallback>,
    on_tab_added: Option<Rc<dyn Fn()>>,
}

impl Navigator {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_config(bounds, NavigatorConfig::default())
    }

    pub fn with_config(bounds: Bounds, config: NavigatorConfig) -> Self {
        let mut nav = Self {
            base: ComponentBase::new(bounds),
            config,
            tabs: Vec::new(),
            pages: ChildList::new(),
            active: None,
            hovered: None,
            hovered_close: None,
            tab_scroll: 0.0,
            max_tab_scroll: 0.0,
            tab_bar: Bounds::ZERO,
            content: Bounds::ZERO,
            add_button: Bounds::ZERO,
            headers: Vec::new(),
            close_buttons: Vec::new(),
            on_tab_changed: None,
            on_tab_closed: None,
            on_tab_added: None,
        };
        nav.layout();
        nav
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: NavigatorConfig) {
        self.config = config;
        self.layout();
    }

    pub fn on_tab_changed(&mut self, f: impl Fn(&str) + 'static) {
        self.on_tab_changed = Some(Rc::new(f));
    }

    pub fn on_tab_closed(&mut self, f: impl Fn(&str) + 'static) {
        self.on_tab_closed = Some(Rc::new(f));
    }

    /// Called when the "+" button is clicked.
    pub fn on_tab_added(&mut self, f: impl Fn() + 'static) {
        self.on_tab_added = Some(Rc::new(f));
    }

    // ---- tabs ----

    /// Appends a tab. Returns `false` if `id` is already taken. The first
    /// tab added becomes active.
    pub fn add_tab(&mut self, id: &str, title: &str, content: impl Component) -> bool {
        self.add_boxed_tab(id, title, Box::new(content))
    }

    pub fn add_boxed_tab(
        &mut self,
        id: &str,
        title: &str,
        mut content: Box<dyn Component>,
    ) -> bool {
        if self.index_of(id).is_some() {
            log::warn!("tab {:?} already exists", id);
            return false;
        }
        content.base_mut().visible = false;
        self.tabs.push(Tab::new(id, title));
        self.pages.push(content);
        self.layout();
        log::debug!("added tab {:?} ({:?})", id, title);
        if self.tabs.len() == 1 {
            self.set_active_tab(id);
        }
        true
    }

    /// Removes a tab, cleaning up its content. If it was active the last
    /// remaining selectable tab takes over.
    pub fn remove_tab(&mut self, id: &str) -> Option<Box<dyn Component>> {
        let index = self.index_of(id)?;
        let was_active = self.active == Some(index);
        let page = self.pages.remove(index);
        let tab = self.tabs.remove(index);

        self.active = match self.active {
            Some(a) if a == index => None,
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        self.hovered = None;
        self.hovered_close = None;
        self.layout();

        if was_active && let Some(next) = self.tabs.iter().rposition(Tab::selectable) {
            let next_id = self.tabs[next].id.clone();
            self.set_active_tab(&next_id);
        }
        if let Some(f) = &self.on_tab_closed {
            f(&tab.id);
        }
        log::debug!("removed tab {:?}", tab.id);
        page
    }

    /// Shows the page of `id`. Disabled, hidden and unknown tabs are
    /// refused.
    pub fn set_active_tab(&mut self, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !self.tabs[index].selectable() {
            return false;
        }
        if self.active == Some(index) {
            return true;
        }
        self.pages.blur();
        if let Some(old) = self.active.and_then(|a| self.pages.get_mut(a)) {
            old.base_mut().visible = false;
        }
        self.active = Some(index);
        self.place_active_page();
        if let Some(f) = &self.on_tab_changed {
            f(id);
        }
        log::debug!("active tab is now {:?}", id);
        true
    }

    /// Id of the active tab.
    pub fn active_tab(&self) -> Option<&str> {
        self.active.map(|i| self.tabs[i].id.as_str())
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn content(&self, id: &str) -> Option<&dyn Component> {
        self.pages.get(self.index_of(id)?)
    }

    pub fn content_as_mut<T: Component>(&mut self, id: &str) -> Option<&mut T> {
        let index = self.index_of(id)?;
        self.pages.get_mut(index)?.downcast_mut::<T>()
    }

    pub fn set_tab_title(&mut self, id: &str, title: &str) {
        if let Some(i) = self.index_of(id) {
            self.tabs[i].title = title.to_string();
            self.layout();
        }
    }

    /// Sets or clears the badge; `color` keeps the previous one when `None`.
    pub fn set_tab_badge(&mut self, id: &str, badge: Option<&str>, color: Option<Color>) {
        if let Some(i) = self.index_of(id) {
            let tab = &mut self.tabs[i];
            tab.badge = badge.map(str::to_string);
            if let Some(c) = color {
                tab.badge_color = c;
            }
        }
    }

    pub fn set_tab_closable(&mut self, id: &str, closable: bool) {
        if let Some(i) = self.index_of(id) {
            self.tabs[i].closable = closable;
            self.layout();
        }
    }

    /// Disabling the active tab moves to the first other selectable one.
    pub fn set_tab_enabled(&mut self, id: &str, enabled: bool) {
        let Some(i) = self.index_of(id) else {
            return;
        };
        self.tabs[i].enabled = enabled;
        if !enabled && self.active == Some(i) {
            let next = self
                .tabs
                .iter()
                .enumerate()
                .find(|(j, t)| *j != i && t.selectable())
                .map(|(_, t)| t.id.clone());
            if let Some(next) = next {
                self.set_active_tab(&next);
            }
        }
    }

    /// Activates the next (`step > 0`) or previous selectable tab,
    /// wrapping around. Returns `true` if the active tab changed.
    pub fn cycle_tab(&mut self, step: isize) -> bool {
        let n = self.tabs.len();
        if n < 2 || step == 0 {
            return false;
        }
        let start = self.active.unwrap_or(0);
        let dir = step.signum();
        let mut i = start;
        for _ in 1..n {
            i = (i as isize + dir).rem_euclid(n as isize) as usize;
            if self.tabs[i].selectable() {
                let id = self.tabs[i].id.clone();
                return self.set_active_tab(&id);
            }
        }
        false
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    // ---- geometry ----

    pub fn tab_bar_bounds(&self) -> Bounds {
        self.tab_bar
    }

    pub fn content_bounds(&self) -> Bounds {
        self.content
    }

    pub fn tab_bounds(&self, id: &str) -> Option<Bounds> {
        self.headers.get(self.index_of(id)?).copied().flatten()
    }

    pub fn tab_scroll(&self) -> f32 {
        self.tab_scroll
    }

    pub fn max_tab_scroll(&self) -> f32 {
        self.max_tab_scroll
    }

    fn layout(&mut self) {
        let b = self.base.bounds;
        let th = self.config.tab_height.min(b.height).max(0.0);
        let side = SIDE_BAR_MIN_WIDTH.max(self.config.tab_height).min(b.width);
        (self.tab_bar, self.content) = match self.config.tab_position {
            TabPosition::Top => (
                Bounds::new(b.x, b.y + b.height - th, b.width, th),
                Bounds::new(b.x, b.y, b.width, b.height - th),
            ),
            TabPosition::Bottom => (
                Bounds::new(b.x, b.y, b.width, th),
                Bounds::new(b.x, b.y + th, b.width, b.height - th),
            ),
            TabPosition::Left => (
                Bounds::new(b.x, b.y, side, b.height),
                Bounds::new(b.x + side, b.y, b.width - side, b.height),
            ),
            TabPosition::Right => (
                Bounds::new(b.x + b.width - side, b.y, side, b.height),
                Bounds::new(b.x, b.y, b.width - side, b.height),
            ),
        };
        self.layout_headers();
        self.place_active_page();
    }

    fn layout_headers(&mut self) {
        let n = self.tabs.len();
        self.headers = vec![None; n];
        self.close_buttons = vec![None; n];
        let visible: Vec<usize> = (0..n).filter(|&i| self.tabs[i].visible).collect();
        let bar = self.tab_bar;
        let th = self.config.tab_height;

        if self.config.tab_position.horizontal() {
            let mut available = bar.width;
            if self.config.show_add_button {
                available -= th;
                self.add_button = Bounds::new(bar.x + bar.width - th, bar.y, th, th);
            }
            if visible.is_empty() {
                self.max_tab_scroll = 0.0;
                self.tab_scroll = 0.0;
                return;
            }
            let count = visible.len() as f32;
            let width = if count * self.config.tab_min_width <= available {
                self.config.tab_max_width.min((available / count).floor())
            } else {
                self.config.tab_min_width
            };
            self.max_tab_scroll = (count * width - available).max(0.0);
            self.tab_scroll = self.tab_scroll.clamp(0.0, self.max_tab_scroll);

            let mut x = bar.x - self.tab_scroll;
            for &i in &visible {
                let header = Bounds::new(x, bar.y, width, bar.height);
                self.headers[i] = Some(header);
                self.close_buttons[i] = self.close_bounds(i, header);
                x += width;
            }
        } else {
            self.max_tab_scroll = 0.0;
            self.tab_scroll = 0.0;
            if visible.is_empty() {
                return;
            }
            let height = th.max((bar.height / visible.len() as f32).floor());
            let mut y = bar.y + bar.height - height;
            for &i in &visible {
                let header = Bounds::new(bar.x, y, bar.width, height);
                self.headers[i] = Some(header);
                self.close_buttons[i] = self.close_bounds(i, header);
                y -= height;
            }
        }
    }

    fn close_bounds(&self, index: usize, header: Bounds) -> Option<Bounds> {
        (self.config.show_close_buttons && self.tabs[index].closable).then(|| {
            Bounds::new(
                header.x + header.width - CLOSE_SIZE - CLOSE_INSET,
                header.y + ((header.height - CLOSE_SIZE) / 2.0).floor(),
                CLOSE_SIZE,
                CLOSE_SIZE,
            )
        })
    }

    fn place_active_page(&mut self) {
        let content = self.content;
        if let Some(page) = self.active.and_then(|a| self.pages.get_mut(a)) {
            let base = page.base_mut();
            base.visible = true;
            base.bounds = content;
            page.update_layout();
        }
    }

    fn header_at(&self, p: Vec2) -> Option<usize> {
        if !self.tab_bar.contains(p) {
            return None;
        }
        self.headers
            .iter()
            .position(|h| h.is_some_and(|h| h.contains(p)))
    }

    // ---- input ----

    fn click(&mut self, p: Vec2) -> bool {
        if !self.tab_bar.contains(p) {
            return false;
        }
        if self.config.show_add_button && self.add_button.contains(p) {
            if let Some(f) = &self.on_tab_added {
                f();
            }
            return true;
        }
        let Some(i) = self.header_at(p) else {
            return false;
        };
        if !self.tabs[i].selectable() {
            return true;
        }
        if self.close_buttons[i].is_some_and(|c| c.contains(p)) {
            let id = self.tabs[i].id.clone();
            self.remove_tab(&id);
            return true;
        }
        let id = self.tabs[i].id.clone();
        self.set_active_tab(&id);
        true
    }

    fn hover(&mut self, p: Vec2) -> bool {
        let hovered = self.header_at(p);
        let close = hovered.filter(|&i| self.close_buttons[i].is_some_and(|c| c.contains(p)));
        let changed = (hovered, close) != (self.hovered, self.hovered_close);
        self.hovered = hovered;
        self.hovered_close = close;
        self.base.cursor = match hovered {
            Some(i) if self.tabs[i].selectable() => CursorType::Hand,
            _ => CursorType::Default,
        };
        changed
    }

    fn wheel(&mut self, event: &UiEvent) -> bool {
        if !self.tab_bar.contains(event.position) {
            return false;
        }
        let delta = event.wheel_delta();
        if self.config.scrollable_tabs && self.max_tab_scroll > 0.0 {
            let old = self.tab_scroll;
            self.tab_scroll =
                (self.tab_scroll - delta * TAB_SCROLL_STEP).clamp(0.0, self.max_tab_scroll);
            if self.tab_scroll != old {
                self.layout_headers();
                return true;
            }
            return false;
        }
        // Wheel up selects the previous tab.
        if delta > 0.0 {
            self.cycle_tab(-1)
        } else if delta < 0.0 {
            self.cycle_tab(1)
        } else {
            false
        }
    }

    fn tab_switch_key(event: &UiEvent) -> Option<isize> {
        let k = event.key_combo()?;
        if k.key != "TAB" || !k.ctrl() || k.alt() {
            return None;
        }
        Some(if k.shift() { -1 } else { 1 })
    }

    // ---- drawing ----

    fn draw_tab(&self, r: &mut Renderer, i: usize, header: Bounds) {
        let s = &self.base.style;
        let tab = &self.tabs[i];
        let active = self.active == Some(i);
        let (bg, text) = if active {
            (s.background, s.text)
        } else if !tab.enabled {
            (
                s.background_for(Interaction::Disabled),
                s.text_for(Interaction::Disabled),
            )
        } else if self.hovered == Some(i) {
            (s.background_for(Interaction::Hovered), s.text)
        } else {
            (s.background.scale_rgb(0.8), s.text)
        };

        let radius = match self.config.tab_style {
            TabStyle::Rounded => 6.0,
            TabStyle::Pill => header.height / 2.0,
            TabStyle::Standard | TabStyle::Underline => 0.0,
        };
        r.draw_rounded_rect(header, radius, bg);
        if !active {
            r.draw_rect_outline(header, 1.0, s.border);
        }
        if active && self.config.tab_style == TabStyle::Underline {
            let color = s.border_for(Interaction::Focused);
            let (from, to) = if self.config.tab_position.horizontal() {
                (
                    Vec2::new(header.x, header.y),
                    Vec2::new(header.right(), header.y),
                )
            } else {
                (
                    Vec2::new(header.x, header.y),
                    Vec2::new(header.x, header.top()),
                )
            };
            r.draw_line(from, to, 2.0, color);
        }

        let mut text_area = header;
        if let Some(close) = self.close_buttons[i] {
            text_area.width -= CLOSE_SIZE + CLOSE_INSET;
            self.draw_close(r, close, self.hovered_close == Some(i));
        }
        let title = fit_title(
            r,
            &tab.title,
            text_area.width - 2.0 * TITLE_INSET,
            s.font_size,
        );
        let y = text_area.y + ((text_area.height - s.font_size) / 2.0).floor();
        r.draw_text(&title, text_area.x + TITLE_INSET, y, s.font_size, text);

        if let Some(badge) = &tab.badge {
            let b = Bounds::new(
                text_area.right() - BADGE_SIZE - 2.0,
                text_area.top() - BADGE_SIZE - 2.0,
                BADGE_SIZE,
                BADGE_SIZE,
            );
            r.draw_rounded_rect(b, BADGE_SIZE / 2.0, tab.badge_color);
            let size = r.measure_text(badge, BADGE_FONT);
            r.draw_text(
                badge,
                b.x + (BADGE_SIZE - size.width) / 2.0,
                b.y + (BADGE_SIZE - BADGE_FONT) / 2.0,
                BADGE_FONT,
                Color::WHITE,
            );
        }
    }

    fn draw_close(&self, r: &mut Renderer, b: Bounds, hovered: bool) {
        let color = if hovered {
            Color::from_rgb(255, 128, 128)
        } else {
            Color::from_rgb(178, 178, 178)
        };
        if hovered {
            r.draw_rounded_rect(b, 3.0, Color::from_rgba(255, 0, 0, 76));
        }
        let c = b.center();
        let k = 4.0;
        r.draw_line(
            Vec2::new(c.x - k, c.y - k),
            Vec2::new(c.x + k, c.y + k),
            1.0,
            color,
        );
        r.draw_line(
            Vec2::new(c.x - k, c.y + k),
            Vec2::new(c.x + k, c.y - k),
            1.0,
            color,
        );
    }

    fn draw_add_button(&self, r: &mut Renderer) {
        let s = &self.base.style;
        let b = self.add_button;
        r.draw_rect(b, s.background.scale_rgb(0.8));
        r.draw_rect_outline(b, 1.0, s.border);
        let c = b.center();
        let k = 6.0;
        r.draw_line(
            Vec2::new(c.x - k, c.y),
            Vec2::new(c.x + k, c.y),
            1.0,
            s.text,
        );
        r.draw_line(
            Vec2::new(c.x, c.y - k),
            Vec2::new(c.x, c.y + k),
            1.0,
            s.text,
        );
    }
}

/// Shortens `title` with a trailing "..." until it fits `max_width`.
fn fit_title(r: &Renderer, title: &str, max_width: f32, font_size: f32) -> String {
    if r.measure_text(title, font_size).width <= max_width {
        return title.to_string();
    }
    let mut chars: Vec<char> = title.chars().collect();
    while chars.len() > 1 {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if r.measure_text(&candidate, font_size).width <= max_width {
            return candidate;
        }
    }
    "...".to_string()
}

impl Component for Navigator {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
        let b = self.base.bounds;
        let s = self.base.style;
        r.draw_rect(b, s.background);

        r.draw_rect(self.tab_bar, s.background.scale_rgb(0.9));
        r.push_clip_rect(self.tab_bar);
        for i in 0..self.tabs.len() {
            if let Some(header) = self.headers[i] {
                self.draw_tab(r, i, header);
            }
        }
        if self.config.show_add_button && self.config.tab_position.horizontal() {
            self.draw_add_button(r);
        }
        r.pop_clip_rect();

        if let Some(page) = self.active.and_then(|a| self.pages.get_mut(a)) {
            r.push_clip_rect(self.content);
            ChildList::render_child(page, r);
            r.pop_clip_rect();
        }
        if s.border_width > 0.0 {
            r.draw_rect_outline(b, s.border_width, s.border);
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
        let in_bar = self.tab_bar.contains(event.position);
        match event.event_type {
            EventType::Click if in_bar => {
                let consumed = self.click(event.position);
                if consumed {
                    ctx.request_redraw();
                }
                return consumed;
            }
            EventType::Press if in_bar => return true,
            EventType::Move => {
                if self.hover(event.position) {
                    ctx.request_redraw();
                }
                let page = self.pages.dispatch(event, ctx);
                return page || in_bar;
            }
            EventType::Leave => {
                if self.hovered.take().is_some() {
                    ctx.request_redraw();
                }
                self.hovered_close = None;
                self.base.cursor = CursorType::Default;
                self.pages.dispatch(event, ctx);
                return false;
            }
            EventType::Wheel if in_bar => {
                let consumed = self.wheel(event);
                if consumed {
                    ctx.request_redraw();
                }
                return consumed;
            }
            EventType::KeyPress => {
                if let Some(step) = Self::tab_switch_key(event) {
                    if self.cycle_tab(step) {
                        ctx.request_redraw();
                    }
                    return true;
                }
            }
            _ => {}
        }
        if self.active.is_none() {
            return false;
        }
        self.pages.dispatch(event, ctx)
    }

    fn set_focused(&mut self, focused: bool) {
        self.base.focused = focused;
        if !focused {
            self.pages.blur();
        }
    }

    fn update_layout(&mut self) {
        self.layout();
    }

    fn refresh_style(&mut self, theme: &dyn ThemeSource) {
        self.base.style.apply_theme(theme);
        self.pages.refresh_style(theme);
    }

    fn accepts_text_input(&self) -> bool {
        self.pages.accepts_text_input()
    }

    fn on_frame(&mut self) -> bool {
        self.pages.on_frame()
    }

    fn as_cleanable(&mut self) -> Option<&mut dyn Cleanable> {
        Some(self)
    }

    fn as_invalidatable(&mut self) -> Option<&mut dyn Invalidatable> {
        Some(self)
    }
}

impl Cleanable for Navigator {
    fn cleanup(&mut self) {
        self.pages.clear();
        self.tabs.clear();
        self.active = None;
        self.hovered = None;
        self.hovered_close = None;
        self.layout();
    }
}

impl Invalidatable for Navigator {
    fn invalidate(&mut self) {
        self.pages.invalidate();
    }
}
