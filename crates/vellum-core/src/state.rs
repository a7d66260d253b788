//! # UI state and event routing
//!
//! [`UiState`] owns every top-level component in a slot arena plus a
//! z-ordered id list (last = topmost). It tracks at most one focused,
//! hovered, and pointer-captured component, and turns raw pointer and key
//! input into routed [`UiEvent`]s:
//!
//! - press captures the hit component and focuses it when focusable; a press
//!   on empty space clears focus,
//! - moves go to the captured component as `Drag`; otherwise they update
//!   hover (`Leave` then `Enter`) and deliver `Move`,
//! - release goes to the captured component, followed by `Click` only if
//!   the pointer is still inside it,
//! - keys and text go to the focused component only.
//!
//! Every routed event is echoed to registered listeners.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use slotmap::SlotMap;

use crate::component::panic_message;
use crate::{
    Clipboard, Component, ComponentId, CursorType, EventCtx, EventType, KeyCombo, MemoryClipboard,
    Renderer, Size, UiEvent, UiRequest, Vec2,
};

/// Observer of routed events. Receives the target, if any.
pub type Listener = Rc<dyn Fn(Option<ComponentId>, &UiEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct UiState {
    components: SlotMap<ComponentId, Box<dyn Component>>,
    z_order: Vec<ComponentId>,
    focused: Option<ComponentId>,
    hovered: Option<ComponentId>,
    captured: Option<ComponentId>,
    mouse: Vec2,
    viewport: Size,
    listeners: Vec<(ListenerId, EventType, Listener)>,
    next_listener: u64,
    clipboard: Box<dyn Clipboard>,
    redraw: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(Box::new(MemoryClipboard::default()))
    }
}

impl UiState {
    pub fn new(clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            components: SlotMap::with_key(),
            z_order: Vec::new(),
            focused: None,
            hovered: None,
            captured: None,
            mouse: Vec2::ZERO,
            viewport: Size::default(),
            listeners: Vec::new(),
            next_listener: 1,
            clipboard,
            redraw: false,
        }
    }

    // ---- arena ----

    pub fn add_component<C: Component>(&mut self, component: C) -> ComponentId {
        self.add_boxed(Box::new(component))
    }

    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = self.components.insert(component);
        if let Some(c) = self.components.get_mut(id) {
            c.base_mut().id = Some(id);
        }
        self.z_order.push(id);
        log::debug!("added component {:?}", id);
        id
    }

    /// Removes `id`, clearing any focus, hover or capture it held and running
    /// its cleanup.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let mut component = self.components.remove(id)?;
        self.z_order.retain(|z| *z != id);
        if self.focused == Some(id) {
            self.focused = None;
            component.set_focused(false);
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.captured == Some(id) {
            self.captured = None;
        }
        component.base_mut().id = None;
        if let Some(c) = component.as_cleanable() {
            c.cleanup();
        }
        log::debug!("removed component {:?}", id);
        Some(component)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Ids bottom to top.
    pub fn z_order(&self) -> &[ComponentId] {
        &self.z_order
    }

    pub fn bring_to_front(&mut self, id: ComponentId) {
        if let Some(pos) = self.z_order.iter().position(|z| *z == id) {
            let id = self.z_order.remove(pos);
            self.z_order.push(id);
        }
    }

    pub fn get(&self, id: ComponentId) -> Option<&(dyn Component + 'static)> {
        self.components.get(id).map(|c| c.as_ref())
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut (dyn Component + 'static)> {
        self.components.get_mut(id).map(|c| c.as_mut())
    }

    pub fn get_as<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.get(id)?.downcast_ref::<T>()
    }

    pub fn get_as_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.get_mut(id)?.downcast_mut::<T>()
    }

    pub fn components_mut(
        &mut self,
    ) -> impl Iterator<Item = (ComponentId, &mut Box<dyn Component>)> {
        self.components.iter_mut()
    }

    pub fn clipboard_mut(&mut self) -> &mut dyn Clipboard {
        self.clipboard.as_mut()
    }

    // ---- queries ----

    pub fn focused(&self) -> Option<ComponentId> {
        self.focused
    }

    pub fn hovered(&self) -> Option<ComponentId> {
        self.hovered
    }

    pub fn captured(&self) -> Option<ComponentId> {
        self.captured
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Topmost visible component containing the point.
    pub fn component_at(&self, x: f32, y: f32) -> Option<ComponentId> {
        self.z_order.iter().rev().copied().find(|id| {
            self.components
                .get(*id)
                .is_some_and(|c| c.base().visible && c.base().bounds.contains_point(x, y))
        })
    }

    /// Cursor of the captured component, else the hovered one.
    pub fn cursor_type(&self) -> CursorType {
        self.captured
            .or(self.hovered)
            .and_then(|id| self.components.get(id))
            .map(|c| c.cursor_type())
            .unwrap_or_default()
    }

    // ---- focus ----

    pub fn set_focus(&mut self, id: Option<ComponentId>) {
        let id = id.filter(|i| self.components.contains_key(*i));
        if id == self.focused {
            return;
        }
        if let Some(old) = self.focused.take() {
            if let Some(c) = self.components.get_mut(old) {
                c.set_focused(false);
            }
            log::debug!("focus lost: {:?}", old);
            self.route(old, &UiEvent::new(EventType::FocusLost, self.mouse));
        }
        if let Some(new) = id {
            self.focused = Some(new);
            if let Some(c) = self.components.get_mut(new) {
                c.set_focused(true);
            }
            log::debug!("focus gained: {:?}", new);
            self.route(new, &UiEvent::new(EventType::FocusGained, self.mouse));
        }
    }

    pub fn clear_focus(&mut self) {
        self.set_focus(None);
    }

    // ---- routing ----

    fn route(&mut self, id: ComponentId, event: &UiEvent) -> bool {
        let viewport = self.viewport;
        let Some(component) = self.components.get_mut(id) else {
            return false;
        };
        let mut ctx = EventCtx::new(self.clipboard.as_mut(), viewport).with_target(id);
        let result =
            panic::catch_unwind(AssertUnwindSafe(|| component.handle_event(event, &mut ctx)));
        let consumed = match result {
            Ok(consumed) => consumed,
            Err(payload) => {
                log::error!(
                    "{:?} on {:?} panicked: {}",
                    event.event_type,
                    id,
                    panic_message(payload.as_ref())
                );
                false
            }
        };
        let (requests, emitted) = ctx.finish();
        self.notify(Some(id), event);
        for e in &emitted {
            self.notify(Some(id), e);
        }
        self.apply_requests(requests);
        consumed
    }

    fn apply_requests(&mut self, requests: Vec<UiRequest>) {
        for request in requests {
            match request {
                UiRequest::Focus(id) => self.set_focus(Some(id)),
                UiRequest::ReleaseFocus(id) => {
                    if self.focused == Some(id) {
                        self.set_focus(None);
                    }
                }
                UiRequest::Redraw => self.redraw = true,
            }
        }
    }

    pub fn handle_press(&mut self, x: f32, y: f32) -> bool {
        self.mouse = Vec2::new(x, y);
        // A release can be lost by the host; never leave two components pressed.
        if let Some(stale) = self.captured.take() {
            if let Some(c) = self.components.get_mut(stale) {
                c.base_mut().pressed = false;
            }
            log::debug!(
                "press while {:?} still captured; dropping its capture",
                stale
            );
            self.redraw = true;
        }
        let Some(id) = self.component_at(x, y) else {
            self.set_focus(None);
            return false;
        };
        self.captured = Some(id);
        let mut focusable = false;
        if let Some(c) = self.components.get_mut(id) {
            let base = c.base_mut();
            base.pressed = true;
            focusable = base.focusable && base.enabled;
        }
        if focusable {
            self.set_focus(Some(id));
        }
        self.route(id, &UiEvent::pointer(EventType::Press, x, y))
    }

    pub fn handle_move(&mut self, x: f32, y: f32) -> bool {
        self.mouse = Vec2::new(x, y);
        if let Some(id) = self.captured {
            return self.route(id, &UiEvent::pointer(EventType::Drag, x, y));
        }
        let hit = self.component_at(x, y);
        if hit != self.hovered {
            if let Some(old) = self.hovered.take() {
                if let Some(c) = self.components.get_mut(old) {
                    c.base_mut().hovered = false;
                }
                self.route(old, &UiEvent::pointer(EventType::Leave, x, y));
            }
            if let Some(new) = hit {
                self.hovered = Some(new);
                if let Some(c) = self.components.get_mut(new) {
                    c.base_mut().hovered = true;
                }
                self.route(new, &UiEvent::pointer(EventType::Enter, x, y));
            }
        }
        match hit {
            Some(id) => self.route(id, &UiEvent::pointer(EventType::Move, x, y)),
            None => false,
        }
    }

    pub fn handle_release(&mut self, x: f32, y: f32) -> bool {
        self.mouse = Vec2::new(x, y);
        let Some(id) = self.captured else {
            return false;
        };
        if let Some(c) = self.components.get_mut(id) {
            c.base_mut().pressed = false;
        }
        let mut consumed = self.route(id, &UiEvent::pointer(EventType::Release, x, y));
        let inside = self
            .components
            .get(id)
            .is_some_and(|c| c.base().visible && c.base().bounds.contains_point(x, y));
        if inside {
            consumed |= self.route(id, &UiEvent::pointer(EventType::Click, x, y));
        }
        self.captured = None;
        consumed
    }

    pub fn handle_wheel(&mut self, x: f32, y: f32, delta: f32) -> bool {
        self.mouse = Vec2::new(x, y);
        match self.component_at(x, y) {
            Some(id) => self.route(id, &UiEvent::wheel(x, y, delta)),
            None => false,
        }
    }

    /// Routes a key to the focused component. Text-accepting components
    /// report every key consumed so host shortcuts never fire under them.
    pub fn handle_key(&mut self, combo: KeyCombo) -> bool {
        let Some(id) = self.focused else {
            return false;
        };
        let consumed = self.route(id, &UiEvent::key(combo));
        let swallow = self
            .components
            .get(id)
            .is_some_and(|c| c.accepts_text_input());
        consumed || swallow
    }

    pub fn handle_text(&mut self, text: &str) -> bool {
        match self.focused {
            Some(id) => self.route(id, &UiEvent::text(text)),
            None => false,
        }
    }

    /// Delivers `event` straight to `id`, bypassing hit-testing.
    pub fn send_event(&mut self, id: ComponentId, event: &UiEvent) -> bool {
        self.route(id, event)
    }

    // ---- listeners ----

    pub fn add_event_listener(
        &mut self,
        event_type: EventType,
        listener: impl Fn(Option<ComponentId>, &UiEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, event_type, Rc::new(listener)));
        id
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Delivers `event` to listeners without routing it to any component.
    pub fn emit_event(&mut self, event: &UiEvent) {
        self.notify(None, event);
    }

    fn notify(&self, source: Option<ComponentId>, event: &UiEvent) {
        let matching: Vec<Listener> = self
            .listeners
            .iter()
            .filter(|(_, t, _)| *t == event.event_type)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in matching {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(source, event)))
            {
                log::error!(
                    "{:?} listener panicked: {}",
                    event.event_type,
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    // ---- frame ----

    pub fn update_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport = Size::new(width.max(0.0), height.max(0.0));
        for c in self.components.values_mut() {
            c.update_layout();
        }
    }

    /// Draws visible components bottom to top. A component whose render
    /// fails is skipped and its clip regions are discarded.
    pub fn render_all(&mut self, renderer: &mut Renderer) {
        for id in self.z_order.clone() {
            let Some(c) = self.components.get_mut(id) else {
                continue;
            };
            if !c.base().visible {
                continue;
            }
            let depth = renderer.clip_depth();
            let result = panic::catch_unwind(AssertUnwindSafe(|| c.render(renderer)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("render of {} failed: {:#}", c.type_name(), e),
                Err(payload) => log::error!(
                    "render of {:?} panicked: {}",
                    id,
                    panic_message(payload.as_ref())
                ),
            }
            renderer.restore_clip_depth(depth);
        }
    }

    /// Runs per-frame hooks; true if anything wants a redraw.
    pub fn tick(&mut self) -> bool {
        let mut redraw = std::mem::take(&mut self.redraw);
        for c in self.components.values_mut() {
            redraw |= c.on_frame();
        }
        redraw
    }

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bounds, ComponentBase};
    use std::cell::RefCell;

    struct Block {
        base: ComponentBase,
    }

    impl Block {
        fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
            Self {
                base: ComponentBase::new(Bounds::new(x, y, w, h)),
            }
        }
    }

    impl Component for Block {
        fn base(&self) -> &ComponentBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }
        fn render(&mut self, _: &mut Renderer) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut s = UiState::default();
        let a = s.add_component(Block::new(0.0, 0.0, 100.0, 100.0));
        let b = s.add_component(Block::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(s.component_at(60.0, 60.0), Some(b));
        assert_eq!(s.component_at(10.0, 10.0), Some(a));
        s.bring_to_front(a);
        assert_eq!(s.component_at(60.0, 60.0), Some(a));
        s.get_mut(a).unwrap().set_visible(false);
        assert_eq!(s.component_at(60.0, 60.0), Some(b));
    }

    #[test]
    fn test_hover_enter_leave_order() {
        let mut s = UiState::default();
        let a = s.add_component(Block::new(0.0, 0.0, 10.0, 10.0));
        let b = s.add_component(Block::new(10.0, 0.0, 10.0, 10.0));
        let log = Rc::new(RefCell::new(Vec::new()));
        for ty in [EventType::Enter, EventType::Leave] {
            let log = log.clone();
            s.add_event_listener(ty, move |id, e| log.borrow_mut().push((id, e.event_type)));
        }
        s.handle_move(5.0, 5.0);
        s.handle_move(15.0, 5.0);
        assert_eq!(
            *log.borrow(),
            vec![
                (Some(a), EventType::Enter),
                (Some(a), EventType::Leave),
                (Some(b), EventType::Enter)
            ]
        );
        assert_eq!(s.hovered(), Some(b));
        assert!(s.get(b).unwrap().base().hovered);
        assert!(!s.get(a).unwrap().base().hovered);
    }

    #[test]
    fn test_drag_goes_to_captured_only() {
        let mut s = UiState::default();
        let a = s.add_component(Block::new(0.0, 0.0, 10.0, 10.0));
        let _b = s.add_component(Block::new(10.0, 0.0, 10.0, 10.0));
        let drags = Rc::new(RefCell::new(Vec::new()));
        let d = drags.clone();
        s.add_event_listener(EventType::Drag, move |id, _| d.borrow_mut().push(id));
        s.handle_press(5.0, 5.0);
        s.handle_move(15.0, 5.0);
        assert_eq!(*drags.borrow(), vec![Some(a)]);
        assert_eq!(s.hovered(), None);
        s.handle_release(15.0, 5.0);
        assert_eq!(s.captured(), None);
    }

    #[test]
    fn test_remove_clears_references() {
        let mut s = UiState::default();
        let mut block = Block::new(0.0, 0.0, 10.0, 10.0);
        block.base.focusable = true;
        let a = s.add_component(block);
        s.handle_move(1.0, 1.0);
        s.handle_press(1.0, 1.0);
        assert_eq!(s.focused(), Some(a));
        let removed = s.remove_component(a).unwrap();
        assert!(!removed.base().focused);
        assert_eq!(s.focused(), None);
        assert_eq!(s.hovered(), None);
        assert_eq!(s.captured(), None);
        // Stale id resolves to nothing.
        s.set_focus(Some(a));
        assert_eq!(s.focused(), None);
        assert!(!s.handle_release(1.0, 1.0));
    }

    #[test]
    fn test_listener_removal() {
        let mut s = UiState::default();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let id = s.add_event_listener(EventType::ValueChanged, move |_, _| *h.borrow_mut() += 1);
        s.emit_event(&UiEvent::value_changed("a"));
        assert!(s.remove_event_listener(id));
        assert!(!s.remove_event_listener(id));
        s.emit_event(&UiEvent::value_changed("b"));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_cursor_type_follows_hover() {
        let mut s = UiState::default();
        let mut b = Block::new(0.0, 0.0, 10.0, 10.0);
        b.base.cursor = CursorType::Hand;
        s.add_component(b);
        assert_eq!(s.cursor_type(), CursorType::Default);
        s.handle_move(2.0, 2.0);
        assert_eq!(s.cursor_type(), CursorType::Hand);
    }
}
