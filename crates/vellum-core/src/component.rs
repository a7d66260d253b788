//! # Components
//!
//! A component is a retained object with bounds, a resolved [`Style`], a few
//! interaction flags, and a table of event handlers. Concrete widgets embed a
//! [`ComponentBase`] and implement [`Component`]; everything except
//! `render` has a sensible default.
//!
//! Handlers are plain closures that receive the component's base, the event
//! and an [`EventCtx`]. They never capture the UI itself: focus changes and
//! redraws are *requested* through the context and applied by the UI state
//! once dispatch returns.
//!
//! Optional behavior is exposed through capability accessors
//! (`as_cleanable`, `as_invalidatable`) rather than by probing.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::{
    Bounds, CursorType, EventType, Interaction, Renderer, Size, Style, ThemeSource, UiEvent,
};

new_key_type! {
    /// Generational handle; a removed component's id never resolves again.
    pub struct ComponentId;
}

pub type Handler =
    Rc<dyn Fn(&mut ComponentBase, &UiEvent, &mut EventCtx<'_>) -> anyhow::Result<bool>>;

/// Text clipboard provided by the host.
pub trait Clipboard {
    fn get_clipboard_text(&mut self) -> String;
    fn set_clipboard_text(&mut self, text: &str);
}

/// In-process clipboard.
#[derive(Clone, Debug, Default)]
pub struct MemoryClipboard {
    text: String,
}

impl Clipboard for MemoryClipboard {
    fn get_clipboard_text(&mut self) -> String {
        self.text.clone()
    }

    fn set_clipboard_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

/// Side effects a handler asks for. Applied after dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum UiRequest {
    Focus(ComponentId),
    ReleaseFocus(ComponentId),
    Redraw,
}

/// Capabilities handed to event handlers.
pub struct EventCtx<'a> {
    pub clipboard: &'a mut dyn Clipboard,
    pub viewport: Size,
    target: Option<ComponentId>,
    requests: Vec<UiRequest>,
    emitted: Vec<UiEvent>,
}

impl<'a> EventCtx<'a> {
    pub fn new(clipboard: &'a mut dyn Clipboard, viewport: Size) -> Self {
        Self {
            clipboard,
            viewport,
            target: None,
            requests: Vec::new(),
            emitted: Vec::new(),
        }
    }

    pub fn with_target(mut self, id: ComponentId) -> Self {
        self.target = Some(id);
        self
    }

    /// The top-level component the event was routed to.
    pub fn target(&self) -> Option<ComponentId> {
        self.target
    }

    pub fn request_focus(&mut self, id: ComponentId) {
        self.requests.push(UiRequest::Focus(id));
    }

    pub fn focus_target(&mut self) {
        if let Some(id) = self.target {
            self.request_focus(id);
        }
    }

    pub fn release_focus(&mut self) {
        if let Some(id) = self.target {
            self.requests.push(UiRequest::ReleaseFocus(id));
        }
    }

    pub fn request_redraw(&mut self) {
        self.requests.push(UiRequest::Redraw);
    }

    /// Queues `event` for the UI's listeners.
    pub fn emit(&mut self, event: UiEvent) {
        self.emitted.push(event);
    }

    pub fn requests(&self) -> &[UiRequest] {
        &self.requests
    }

    pub fn emitted(&self) -> &[UiEvent] {
        &self.emitted
    }

    pub fn finish(self) -> (Vec<UiRequest>, Vec<UiEvent>) {
        (self.requests, self.emitted)
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// State every component carries.
pub struct ComponentBase {
    pub bounds: Bounds,
    pub style: Style,
    pub visible: bool,
    pub enabled: bool,
    pub focused: bool,
    pub hovered: bool,
    pub pressed: bool,
    pub focusable: bool,
    pub cursor: CursorType,
    /// Set when the component is added to a UI.
    pub id: Option<ComponentId>,
    handlers: HashMap<EventType, SmallVec<[Handler; 2]>>,
}

impl Default for ComponentBase {
    fn default() -> Self {
        Self::new(Bounds::ZERO)
    }
}

impl ComponentBase {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            style: Style::default(),
            visible: true,
            enabled: true,
            focused: false,
            hovered: false,
            pressed: false,
            focusable: false,
            cursor: CursorType::Default,
            id: None,
            handlers: HashMap::new(),
        }
    }

    pub fn add_event_handler<F>(&mut self, event_type: EventType, handler: F)
    where
        F: Fn(&mut ComponentBase, &UiEvent, &mut EventCtx<'_>) -> anyhow::Result<bool> + 'static,
    {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(Rc::new(handler));
    }

    pub fn clear_event_handlers(&mut self, event_type: EventType) {
        self.handlers.remove(&event_type);
    }

    pub fn has_handlers(&self, event_type: EventType) -> bool {
        self.handlers
            .get(&event_type)
            .is_some_and(|list| !list.is_empty())
    }

    pub fn interaction(&self) -> Interaction {
        if !self.enabled {
            Interaction::Disabled
        } else if self.pressed {
            Interaction::Pressed
        } else if self.focused {
            Interaction::Focused
        } else if self.hovered {
            Interaction::Hovered
        } else {
            Interaction::Idle
        }
    }

    /// Runs the handlers for `event` in registration order until one
    /// consumes it. A failing or panicking handler is logged and skipped.
    pub fn dispatch(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        let Some(list) = self.handlers.get(&event.event_type) else {
            return false;
        };
        let list = list.clone();
        for handler in list.iter() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(self, event, ctx)));
            match result {
                Ok(Ok(true)) => return true,
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    log::error!("{:?} handler failed: {:#}", event.event_type, e);
                }
                Err(payload) => {
                    log::error!(
                        "{:?} handler panicked: {}",
                        event.event_type,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        false
    }
}

/// Releases external resources when a component leaves the UI.
pub trait Cleanable {
    fn cleanup(&mut self);
}

/// Drops cached layout or measurement data.
pub trait Invalidatable {
    fn invalidate(&mut self);
}

pub trait Component: Any {
    fn base(&self) -> &ComponentBase;
    fn base_mut(&mut self) -> &mut ComponentBase;

    fn render(&mut self, renderer: &mut Renderer) -> anyhow::Result<()>;

    /// Short type name used by the registry, e.g. `"Button"`.
    fn type_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn handle_event(&mut self, event: &UiEvent, ctx: &mut EventCtx<'_>) -> bool {
        let base = self.base_mut();
        if !base.visible || !base.enabled {
            return false;
        }
        base.dispatch(event, ctx)
    }

    fn add_event_handler(
        &mut self,
        event_type: EventType,
        handler: impl Fn(&mut ComponentBase, &UiEvent, &mut EventCtx<'_>) -> anyhow::Result<bool>
        + 'static,
    ) where
        Self: Sized,
    {
        self.base_mut().add_event_handler(event_type, handler);
    }

    fn set_position(&mut self, x: f32, y: f32) {
        let b = &mut self.base_mut().bounds;
        b.x = x;
        b.y = y;
        self.update_layout();
    }

    fn set_size(&mut self, width: f32, height: f32) {
        let b = self.base().bounds;
        self.base_mut().bounds = Bounds::new(b.x, b.y, width, height);
        self.update_layout();
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.base_mut().bounds = Bounds::new(bounds.x, bounds.y, bounds.width, bounds.height);
        self.update_layout();
    }

    fn set_visible(&mut self, visible: bool) {
        self.base_mut().visible = visible;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.base_mut().enabled = enabled;
    }

    fn set_focused(&mut self, focused: bool) {
        self.base_mut().focused = focused;
    }

    /// Recomputes anything derived from bounds.
    fn update_layout(&mut self) {}

    fn refresh_style(&mut self, theme: &dyn ThemeSource) {
        self.base_mut().style.apply_theme(theme);
    }

    fn preferred_size(&self) -> Size {
        self.base().bounds.size()
    }

    /// Components that take text swallow every key while focused.
    fn accepts_text_input(&self) -> bool {
        false
    }

    fn cursor_type(&self) -> CursorType {
        self.base().cursor
    }

    /// Per-frame hook. Returns `true` when a redraw is needed.
    fn on_frame(&mut self) -> bool {
        false
    }

    fn as_cleanable(&mut self) -> Option<&mut dyn Cleanable> {
        None
    }

    fn as_invalidatable(&mut self) -> Option<&mut dyn Invalidatable> {
        None
    }
}

impl dyn Component {
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = self;
        any.downcast_mut::<T>()
    }

    pub fn is<T: Component>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec2;
    use std::cell::RefCell;

    struct Stub {
        base: ComponentBase,
    }

    impl Component for Stub {
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

    fn click() -> UiEvent {
        UiEvent::new(EventType::Click, Vec2::ZERO)
    }

    #[test]
    fn test_type_name_is_short() {
        let p = Stub {
            base: ComponentBase::default(),
        };
        assert_eq!(p.type_name(), "Stub");
        let boxed: Box<dyn Component> = Box::new(p);
        assert!(boxed.is::<Stub>());
    }

    #[test]
    fn test_dispatch_short_circuits_and_survives_faults() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut base = ComponentBase::default();

        let c = calls.clone();
        base.add_event_handler(EventType::Click, move |_, _, _| {
            c.borrow_mut().push("err");
            anyhow::bail!("boom")
        });
        let c = calls.clone();
        base.add_event_handler(EventType::Click, move |_, _, _| {
            c.borrow_mut().push("panic");
            panic!("handler panic")
        });
        let c = calls.clone();
        base.add_event_handler(EventType::Click, move |b, _, _| {
            c.borrow_mut().push("consume");
            b.pressed = true;
            Ok(true)
        });
        let c = calls.clone();
        base.add_event_handler(EventType::Click, move |_, _, _| {
            c.borrow_mut().push("never");
            Ok(true)
        });

        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::default());
        assert!(base.dispatch(&click(), &mut ctx));
        assert_eq!(*calls.borrow(), vec!["err", "panic", "consume"]);
        assert!(base.pressed);
    }

    #[test]
    fn test_disabled_component_ignores_events() {
        let mut p = Stub {
            base: ComponentBase::default(),
        };
        p.add_event_handler(EventType::Click, |_, _, _| Ok(true));
        p.set_enabled(false);
        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::default());
        assert!(!p.handle_event(&click(), &mut ctx));
    }

    #[test]
    fn test_context_collects_requests() {
        let mut clip = MemoryClipboard::default();
        let mut ctx = EventCtx::new(&mut clip, Size::new(10.0, 10.0));
        ctx.clipboard.set_clipboard_text("copied");
        ctx.request_redraw();
        ctx.emit(UiEvent::value_changed("x"));
        let (requests, emitted) = ctx.finish();
        assert_eq!(requests, vec![UiRequest::Redraw]);
        assert_eq!(emitted.len(), 1);
        assert_eq!(clip.get_clipboard_text(), "copied");
    }
}
