//! Label, Button and Panel.

use std::rc::Rc;

use vellum_core::{
    Bounds, Cleanable, Component, ComponentBase, CursorType, EventCtx, EventType, Invalidatable,
    Renderer, Size, ThemeSource, UiEvent,
};

use crate::container::ChildList;

/// Static single-line text, vertically centred in its bounds.
pub struct Label {
    base: ComponentBase,
    text: String,
    /// Draw the style background behind the text.
    pub filled: bool,
}

impl Label {
    pub fn new(bounds: Bounds, text: impl Into<String>) -> Self {
        Self {
            base: ComponentBase::new(bounds),
            text: text.into(),
            filled: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Component for Label {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
        let b = self.base.bounds;
        let s = &self.base.style;
        if self.filled {
            r.draw_rounded_rect(b, s.corner_radius, s.background);
        }
        let y = b.y + (b.height - s.font_size) / 2.0;
        let color = s.text_for(self.base.interaction());
        r.draw_text(&self.text, b.x + s.padding, y, s.font_size, color);
        Ok(())
    }

    fn preferred_size(&self) -> Size {
        // Rough advance until a renderer is available to measure with.
        let s = &self.base.style;
        let w = self.text.chars().count() as f32 * s.font_size * 0.6;
        Size::new(w + 2.0 * s.padding, s.font_size + 2.0 * s.padding)
    }
}

/// A clickable, focusable button. Enter or Space activates it while
/// focused.
pub struct Button {
    base: ComponentBase,
    text: String,
    on_click: Option<Rc<dyn Fn()>>,
}

impl Button {
    pub fn new(bounds: Bounds, text: impl Into<String>) -> Self {
        let mut base = ComponentBase::new(bounds);
        base.focusable = true;
        base.cursor = CursorType::Hand;
        Self {
            base,
            text: text.into(),
            on_click: None,
        }
    }

    pub fn on_click(mut self, f: impl Fn() + 'static) -> Self {
        self.on_click = Some(Rc::new(f));
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    fn activate(&self, ctx: &mut EventCtx<'_>) -> bool {
        match &self.on_click {
            Some(f) => {
                f();
                ctx.request_redraw();
                true
            }
            None => false,
        }
    }
}

impl Component for Button {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
        let b = self.base.bounds;
        let s = self.base.style;
        let state = self.base.interaction();
        r.draw_rounded_rect(b, s.corner_radius, s.background_for(state));
        if s.border_width > 0.0 {
            r.draw_rounded_rect_outline(b, s.corner_radius, s.border_width, s.border_for(state));
        }
        let text = r.measure_text(&self.text, s.font_size);
        let x = b.x + (b.width - text.width).max(0.0) / 2.0;
        let y = b.y + (b.height - s.font_size).max(0.0) / 2.0;
        r.draw_text(&self.text, x, y, s.font_size, s.text_for(state));
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
            EventType::Click => self.activate(ctx),
            EventType::Press | EventType::Release => {
                ctx.request_redraw();
                true
            }
            EventType::Enter | EventType::Leave => {
                ctx.request_redraw();
                false
            }
            EventType::KeyPress if self.base.focused => {
                let activates = event.key_combo().is_some_and(|k| {
                    k.modifiers.is_empty() && matches!(k.key.as_str(), "RET" | "SPACE")
                });
                activates && self.activate(ctx)
            }
            _ => false,
        }
    }

    fn preferred_size(&self) -> Size {
        let s = &self.base.style;
        let w = self.text.chars().count() as f32 * s.font_size * 0.6;
        Size::new(w + 2.0 * s.padding, s.font_size + 2.0 * s.padding)
    }
}

/// A plain container. Children keep absolute UI coordinates and are clipped
/// to the panel.
pub struct Panel {
    base: ComponentBase,
    children: ChildList,
}

impl Panel {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            base: ComponentBase::new(bounds),
            children: ChildList::new(),
        }
    }

    pub fn add_child(&mut self, child: impl Component) -> usize {
        self.children.push(Box::new(child))
    }

    pub fn add_boxed(&mut self, child: Box<dyn Component>) -> usize {
        self.children.push(child)
    }

    /// Removes a child, running its cleanup first.
    pub fn remove_child(&mut self, index: usize) -> Option<Box<dyn Component>> {
        self.children.remove(index)
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    pub fn children(&self) -> &ChildList {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut ChildList {
        &mut self.children
    }

    /// Downcasts child `index`.
    pub fn child_as_mut<T: Component>(&mut self, index: usize) -> Option<&mut T> {
        self.children.get_mut(index)?.downcast_mut::<T>()
    }
}

impl Component for Panel {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
        let b = self.base.bounds;
        let s = self.base.style;
        r.draw_rounded_rect(b, s.corner_radius, s.background);
        r.push_clip_rect(b);
        for child in self.children.iter_mut() {
            if child.base().visible {
                ChildList::render_child(child.as_mut(), r);
            }
        }
        r.pop_clip_rect();
        if s.border_width > 0.0 {
            r.draw_rounded_rect_outline(b, s.corner_radius, s.border_width, s.border);
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
        self.children.dispatch(event, ctx)
    }

    fn set_focused(&mut self, focused: bool) {
        self.base.focused = focused;
        if !focused {
            self.children.blur();
        }
    }

    fn update_layout(&mut self) {
        self.children.update_layout();
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

impl Cleanable for Panel {
    fn cleanup(&mut self) {
        self.children.clear();
    }
}

impl Invalidatable for Panel {
    fn invalidate(&mut self) {
        self.children.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use vellum_core::headless::{DrawOp, MonospaceMeasure, RecordingSurface};
    use vellum_core::{KeyCombo, Ui};

    use crate::TextInput;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let n = Rc::new(Cell::new(0));
        let c = n.clone();
        (n, move || c.set(c.get() + 1))
    }

    #[test]
    fn test_button_clicks_only_when_released_inside() {
        let (clicks, f) = counter();
        let mut ui = Ui::with_defaults();
        let a = ui.add(
            Button::new(Bounds::new(0.0, 0.0, 100.0, 40.0), "A").on_click(f),
            None,
        );
        let (other, g) = counter();
        ui.add(
            Button::new(Bounds::new(200.0, 0.0, 100.0, 40.0), "B").on_click(g),
            None,
        );

        ui.handle_press(50.0, 20.0);
        ui.handle_release(50.0, 20.0);
        assert_eq!(clicks.get(), 1);
        assert_eq!(ui.state().focused(), Some(a));

        // Press on A, release on B: neither clicks.
        ui.handle_press(50.0, 20.0);
        ui.handle_move(250.0, 20.0);
        ui.handle_release(250.0, 20.0);
        assert_eq!(clicks.get(), 1);
        assert_eq!(other.get(), 0);

        assert!(ui.handle_key(KeyCombo::plain("RET")));
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn test_panel_routes_typing_to_child_input() {
        let mut ui = Ui::with_defaults();
        let mut panel = Panel::new(Bounds::new(0.0, 0.0, 400.0, 300.0));
        panel.add_child(Label::new(Bounds::new(10.0, 250.0, 200.0, 30.0), "Name"));
        panel.add_child(TextInput::new(
            Bounds::new(10.0, 10.0, 380.0, 200.0),
            Rc::new(MonospaceMeasure::default()),
        ));
        let id = ui.add(panel, Some("form"));

        ui.handle_press(50.0, 100.0);
        ui.handle_release(50.0, 100.0);
        assert_eq!(ui.state().focused(), Some(id));
        ui.handle_text("hi");
        // Unmapped keys are swallowed because the focused child takes text.
        assert!(ui.handle_key(KeyCombo::plain("A")));

        let panel = ui.get_as_mut::<Panel>(id).unwrap();
        assert_eq!(panel.child_as_mut::<TextInput>(1).unwrap().text(), "hi");

        // A press on the panel outside any child blurs the input.
        ui.handle_press(300.0, 250.0);
        let panel = ui.get_as_mut::<Panel>(id).unwrap();
        assert!(!panel.children().accepts_text_input());
    }

    #[test]
    fn test_panel_render_is_clipped_and_balanced() {
        let mut panel = Panel::new(Bounds::new(0.0, 0.0, 100.0, 100.0));
        panel.add_child(Label::new(Bounds::new(10.0, 10.0, 80.0, 20.0), "inside"));
        let surface = RecordingSurface::new();
        let ops = surface.ops();
        let mut renderer = Renderer::new(Box::new(surface));
        panel.render(&mut renderer).unwrap();
        assert_eq!(renderer.clip_depth(), 0);
        let ops = ops.borrow();
        assert!(ops.contains(&DrawOp::Scissor(Some(Bounds::new(0.0, 0.0, 100.0, 100.0)))));
        assert!(
            ops.iter()
                .any(|op| matches!(op, DrawOp::Text(s, _, _) if s == "inside"))
        );
        assert!(ops.contains(&DrawOp::Scissor(None)));
    }
}
