//! Child ownership and event forwarding shared by [`Panel`](crate::Panel)
//! and [`ScrollView`](crate::ScrollView).
//!
//! A container owns its children outright. The UI state only knows the
//! container, so pointer capture, hover and keyboard focus *inside* the
//! container are tracked here, mirroring what [`vellum_core::UiState`] does
//! for top-level components:
//!
//! - a press is offered to the topmost child under the pointer; if that
//!   child consumes it, later drags and the release go to the same child,
//! - a release inside the pressed child is followed by a `Click`,
//! - a focusable child that consumes a press becomes the focused child and
//!   the container asks to be focused itself,
//! - keys and text go to the focused child.
//!
//! Events arrive already translated into the children's coordinate space.

use vellum_core::{Component, EventCtx, EventType, Renderer, UiEvent};

#[derive(Default)]
pub struct ChildList {
    children: Vec<Box<dyn Component>>,
    pressed: Option<usize>,
    hovered: Option<usize>,
    focused: Option<usize>,
}

impl ChildList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn push(&mut self, child: Box<dyn Component>) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    /// Removes and returns the child at `index`, after running its cleanup.
    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Component>> {
        if index >= self.children.len() {
            return None;
        }
        if self.focused == Some(index) {
            self.blur();
        }
        let mut child = self.children.remove(index);
        if let Some(c) = child.as_cleanable() {
            c.cleanup();
        }
        let shift = |slot: &mut Option<usize>| {
            *slot = match *slot {
                Some(i) if i == index => None,
                Some(i) if i > index => Some(i - 1),
                other => other,
            };
        };
        shift(&mut self.pressed);
        shift(&mut self.hovered);
        shift(&mut self.focused);
        Some(child)
    }

    /// Cleans up and drops every child.
    pub fn clear(&mut self) {
        self.blur();
        for child in &mut self.children {
            if let Some(c) = child.as_cleanable() {
                c.cleanup();
            }
        }
        log::debug!("cleared {} child component(s)", self.children.len());
        self.children.clear();
        self.pressed = None;
        self.hovered = None;
    }

    pub fn get(&self, index: usize) -> Option<&dyn Component> {
        self.children.get(index).map(|c| c.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Component + 'static)> {
        self.children.get_mut(index).map(|c| c.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Component> {
        self.children.iter().map(|c| c.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Component>> {
        self.children.iter_mut()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn focused_child(&self) -> Option<&dyn Component> {
        self.focused.and_then(|i| self.get(i))
    }

    /// Moves keyboard focus to child `index`.
    pub fn focus(&mut self, index: usize) {
        if self.focused == Some(index) || index >= self.children.len() {
            return;
        }
        self.blur();
        self.children[index].set_focused(true);
        self.focused = Some(index);
    }

    /// Unfocuses the focused child, if any.
    pub fn blur(&mut self) {
        if let Some(i) = self.focused.take()
            && let Some(c) = self.children.get_mut(i)
        {
            c.set_focused(false);
        }
    }

    /// Topmost visible child containing the event position.
    fn child_at(&self, event: &UiEvent) -> Option<usize> {
        self.children
            .iter()
            .rposition(|c| c.base().visible && c.base().bounds.contains(event.position))
    }

    pub fn accepts_text_input(&self) -> bool {
        self.focused_child().is_some_and(|c| c.accepts_text_input())
    }

    /// Routes `event` to the appropriate child. Returns `true` if a child
    /// consumed it.
    pub fn dispatch(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        match event.event_type {
            EventType::Press => self.press(event, ctx),
            EventType::Drag => match self.pressed {
                Some(i) => self.children[i].handle_event(event, ctx),
                None => false,
            },
            EventType::Release => {
                let Some(i) = self.pressed.take() else {
                    return false;
                };
                let child = &mut self.children[i];
                child.base_mut().pressed = false;
                let mut consumed = child.handle_event(event, ctx);
                if child.base().visible && child.base().bounds.contains(event.position) {
                    consumed |= child.handle_event(&event.with_type(EventType::Click), ctx);
                }
                consumed
            }
            EventType::Move => self.hover(event, ctx),
            EventType::Leave => {
                if let Some(i) = self.hovered.take() {
                    self.children[i].base_mut().hovered = false;
                    self.children[i].handle_event(event, ctx);
                }
                false
            }
            EventType::Wheel => match self.child_at(event) {
                Some(i) => self.children[i].handle_event(event, ctx),
                None => false,
            },
            EventType::KeyPress | EventType::TextInput => match self.focused {
                Some(i) => self.children[i].handle_event(event, ctx),
                None => false,
            },
            _ => false,
        }
    }

    fn press(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        let Some(i) = self.child_at(event) else {
            self.blur();
            return false;
        };
        let child = &mut self.children[i];
        child.base_mut().pressed = true;
        let focusable = child.base().focusable && child.base().enabled;
        if focusable {
            self.focus(i);
            ctx.focus_target();
        }
        let consumed = self.children[i].handle_event(event, ctx);
        if consumed {
            self.pressed = Some(i);
        } else {
            self.children[i].base_mut().pressed = false;
        }
        consumed
    }

    fn hover(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        let hit = self.child_at(event);
        if hit != self.hovered {
            if let Some(old) = self.hovered.take() {
                self.children[old].base_mut().hovered = false;
                self.children[old].handle_event(&event.with_type(EventType::Leave), ctx);
            }
            if let Some(new) = hit {
                self.hovered = Some(new);
                self.children[new].base_mut().hovered = true;
                self.children[new].handle_event(&event.with_type(EventType::Enter), ctx);
            }
        }
        match hit {
            Some(i) => self.children[i].handle_event(event, ctx),
            None => false,
        }
    }

    /// Per-frame hooks of every child.
    pub fn on_frame(&mut self) -> bool {
        self.children
            .iter_mut()
            .fold(false, |redraw, c| c.on_frame() | redraw)
    }

    pub fn update_layout(&mut self) {
        for c in &mut self.children {
            c.update_layout();
        }
    }

    pub fn invalidate(&mut self) {
        for c in &mut self.children {
            if let Some(inv) = c.as_invalidatable() {
                inv.invalidate();
            }
        }
    }

    pub fn refresh_style(&mut self, theme: &dyn vellum_core::ThemeSource) {
        for c in &mut self.children {
            c.refresh_style(theme);
        }
    }

    /// Renders one child, logging and skipping it if it fails. The clip
    /// stack is restored either way.
    pub fn render_child(child: &mut dyn Component, renderer: &mut Renderer) {
        let depth = renderer.clip_depth();
        if let Err(e) = child.render(renderer) {
            log::error!("render of child {} failed: {:#}", child.type_name(), e);
        }
        renderer.restore_clip_depth(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vellum_core::{Bounds, Cleanable, ComponentBase, MemoryClipboard, Size};

    struct Child {
        base: ComponentBase,
        log: Rc<RefCell<Vec<String>>>,
        name: &'static str,
    }

    impl Child {
        fn boxed(name: &'static str, bounds: Bounds, log: &Rc<RefCell<Vec<String>>>) -> Box<Self> {
            let mut base = ComponentBase::new(bounds);
            base.focusable = true;
            Box::new(Self {
                base,
                log: log.clone(),
                name,
            })
        }
    }

    impl Component for Child {
        fn base(&self) -> &ComponentBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }
        fn render(&mut self, _: &mut Renderer) -> anyhow::Result<()> {
            Ok(())
        }
        fn handle_event(&mut self, event: &UiEvent, _: &mut EventCtx<'_>) -> bool {
            self.log
                .borrow_mut()
                .push(format!("{}:{:?}", self.name, event.event_type));
            true
        }
        fn set_focused(&mut self, focused: bool) {
            self.base.focused = focused;
            self.log
                .borrow_mut()
                .push(format!("{}:focus={}", self.name, focused));
        }
        fn as_cleanable(&mut self) -> Option<&mut dyn Cleanable> {
            Some(self)
        }
    }

    impl Cleanable for Child {
        fn cleanup(&mut self) {
            self.log.borrow_mut().push(format!("{}:cleanup", self.name));
        }
    }

    fn list(log: &Rc<RefCell<Vec<String>>>) -> ChildList {
        let mut children = ChildList::new();
        children.push(Child::boxed("a", Bounds::new(0.0, 0.0, 50.0, 50.0), log));
        children.push(Child::boxed("b", Bounds::new(25.0, 0.0, 50.0, 50.0), log));
        children
    }

    #[test]
    fn test_press_captures_topmost_and_release_clicks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut children = list(&log);
        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(100.0, 100.0));

        assert!(children.dispatch(&UiEvent::pointer(EventType::Press, 30.0, 10.0), &mut ctx));
        children.dispatch(&UiEvent::pointer(EventType::Drag, 5.0, 10.0), &mut ctx);
        // Released over "a": "b" still gets the release, but no click.
        children.dispatch(&UiEvent::pointer(EventType::Release, 5.0, 10.0), &mut ctx);

        assert_eq!(
            *log.borrow(),
            vec!["b:focus=true", "b:Press", "b:Drag", "b:Release"]
        );
        assert_eq!(children.focused(), Some(1));
    }

    #[test]
    fn test_keys_follow_child_focus() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut children = list(&log);
        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(100.0, 100.0));

        assert!(!children.dispatch(&UiEvent::text("x"), &mut ctx));
        children.dispatch(&UiEvent::pointer(EventType::Press, 10.0, 10.0), &mut ctx);
        children.dispatch(&UiEvent::pointer(EventType::Release, 10.0, 10.0), &mut ctx);
        children.dispatch(&UiEvent::text("x"), &mut ctx);
        children.dispatch(&UiEvent::pointer(EventType::Press, 60.0, 10.0), &mut ctx);

        assert_eq!(
            *log.borrow(),
            vec![
                "a:focus=true",
                "a:Press",
                "a:Release",
                "a:Click",
                "a:TextInput",
                "a:focus=false",
                "b:focus=true",
                "b:Press",
            ]
        );
    }

    #[test]
    fn test_remove_cleans_up_and_shifts_indices() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut children = list(&log);
        children.focus(1);
        assert!(children.remove(0).is_some());
        assert_eq!(children.focused(), Some(0));
        assert!(children.remove(5).is_none());
        children.clear();
        assert!(children.is_empty());
        assert_eq!(
            *log.borrow(),
            vec!["b:focus=true", "a:cleanup", "b:focus=false", "b:cleanup"]
        );
    }
}
