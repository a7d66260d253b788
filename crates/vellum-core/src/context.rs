//! # The UI context
//!
//! [`Ui`] is the explicit owner of one UI: component state, the name
//! registry, the layout manager, the theme source, and the mailbox inbox.
//! There are no globals. The host constructs a `Ui`, feeds it input and
//! frames, and drops it (or calls [`Ui::shutdown`]) to tear everything
//! down.
//!
//! ```rust
//! use vellum_core::*;
//!
//! struct Square {
//!     base: ComponentBase,
//! }
//!
//! impl Component for Square {
//!     fn base(&self) -> &ComponentBase { &self.base }
//!     fn base_mut(&mut self) -> &mut ComponentBase { &mut self.base }
//!     fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
//!         r.draw_rect(self.base.bounds, self.base.style.background);
//!         Ok(())
//!     }
//! }
//!
//! let mut ui = Ui::with_defaults();
//! let id = ui.add(
//!     Square { base: ComponentBase::new(Bounds::new(0.0, 0.0, 40.0, 40.0)) },
//!     Some("square"),
//! );
//! assert_eq!(ui.find("square"), Some(id));
//!
//! let mut renderer = Renderer::new(Box::new(headless::RecordingSurface::new()));
//! ui.render(&mut renderer);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::mailbox::{self, Inbox};
use crate::{
    Bounds, Clipboard, Component, ComponentId, KeyCombo, LayoutManager, LayoutTarget, Mailbox,
    MemoryClipboard, Palette, Registry, Renderer, ThemeSource, UiError, UiState,
};

pub struct Ui {
    state: UiState,
    registry: Registry,
    layout: LayoutManager,
    theme: Box<dyn ThemeSource>,
    inbox: Inbox,
    torn_down: bool,
}

impl Ui {
    pub fn new(theme: Box<dyn ThemeSource>, clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            state: UiState::new(clipboard),
            registry: Registry::new(),
            layout: LayoutManager::new(),
            theme,
            inbox: Arc::new(Mutex::new(VecDeque::new())),
            torn_down: false,
        }
    }

    /// Built-in palette and an in-memory clipboard.
    pub fn with_defaults() -> Self {
        Self::new(
            Box::new(Palette::default()),
            Box::new(MemoryClipboard::default()),
        )
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut UiState {
        &mut self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn layout(&self) -> &LayoutManager {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut LayoutManager {
        &mut self.layout
    }

    pub fn theme(&self) -> &dyn ThemeSource {
        self.theme.as_ref()
    }

    pub fn set_theme(&mut self, theme: Box<dyn ThemeSource>) {
        self.theme = theme;
        self.restyle_all();
    }

    pub fn mailbox(&self) -> Mailbox {
        Mailbox::new(&self.inbox)
    }

    // ---- components ----

    /// Resolves the component's style, adds it on top, registers and
    /// mounts it.
    pub fn add<C: Component>(&mut self, component: C, name: Option<&str>) -> ComponentId {
        self.add_boxed(Box::new(component), name)
    }

    pub fn add_boxed(
        &mut self,
        mut component: Box<dyn Component>,
        name: Option<&str>,
    ) -> ComponentId {
        component.refresh_style(self.theme.as_ref());
        let type_name = component.type_name();
        let id = self.state.add_boxed(component);
        self.registry.register(id, type_name, name);
        self.registry.mark_mounted(id);
        id
    }

    /// Removes a component from layouts, the registry and the state.
    pub fn remove(&mut self, id: ComponentId) -> bool {
        self.layout.forget_component(id);
        self.registry.unregister(id);
        self.state.remove_component(id).is_some()
    }

    pub fn remove_by_name(&mut self, name: &str) -> Result<(), UiError> {
        let id = self
            .find(name)
            .ok_or_else(|| UiError::UnknownName(name.to_string()))?;
        self.remove(id);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.registry.get_by_name(name)
    }

    pub fn get(&self, id: ComponentId) -> Option<&(dyn Component + 'static)> {
        self.state.get(id)
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut (dyn Component + 'static)> {
        self.state.get_mut(id)
    }

    pub fn get_as<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.state.get_as(id)
    }

    pub fn get_as_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.state.get_as_mut(id)
    }

    /// Like [`Ui::get_as_mut`] but reports why the lookup failed.
    pub fn expect_as_mut<T: Component>(&mut self, id: ComponentId) -> Result<&mut T, UiError> {
        self.state
            .get_as_mut(id)
            .ok_or(UiError::UnknownComponent(id))
    }

    pub fn mark_for_update(&mut self, id: ComponentId) {
        self.registry.mark_for_update(id);
    }

    /// Lays out container `name` inside `bounds`.
    pub fn update_layout(&mut self, name: &str, bounds: Bounds) -> Result<(), UiError> {
        self.layout.update_layout(name, bounds, &mut self.state)?;
        Ok(())
    }

    // ---- per-frame ----

    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.update_viewport_size(width, height);
        self.layout
            .handle_viewport_change(width, height, &mut self.state as &mut dyn LayoutTarget);
    }

    /// Re-derives every style when the theme source reports a change.
    pub fn poll_theme(&mut self) -> bool {
        if !self.theme.has_theme_changed() {
            return false;
        }
        log::debug!("theme changed; restyling {} component(s)", self.state.len());
        self.restyle_all();
        true
    }

    fn restyle_all(&mut self) {
        let theme = self.theme.as_ref();
        for (_, c) in self.state.components_mut() {
            c.refresh_style(theme);
            if let Some(inv) = c.as_invalidatable() {
                inv.invalidate();
            }
        }
        self.state.request_redraw();
    }

    /// Drains the mailbox and flushes queued component updates.
    pub fn poll(&mut self) -> usize {
        let delivered = mailbox::drain(&self.inbox, &mut self.state);
        let updated = self.registry.process_updates(&mut self.state);
        delivered + updated
    }

    /// Runs per-frame hooks; true if a redraw is wanted.
    pub fn tick(&mut self) -> bool {
        self.state.tick()
    }

    pub fn render(&mut self, renderer: &mut Renderer) {
        let mut pass = renderer.begin_pass();
        self.state.render_all(&mut pass);
    }

    // ---- input ----

    pub fn handle_press(&mut self, x: f32, y: f32) -> bool {
        self.state.handle_press(x, y)
    }

    pub fn handle_move(&mut self, x: f32, y: f32) -> bool {
        self.state.handle_move(x, y)
    }

    pub fn handle_release(&mut self, x: f32, y: f32) -> bool {
        self.state.handle_release(x, y)
    }

    pub fn handle_wheel(&mut self, x: f32, y: f32, delta: f32) -> bool {
        self.state.handle_wheel(x, y, delta)
    }

    pub fn handle_key(&mut self, combo: KeyCombo) -> bool {
        self.state.handle_key(combo)
    }

    pub fn handle_text(&mut self, text: &str) -> bool {
        self.state.handle_text(text)
    }

    // ---- teardown ----

    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let ids: Vec<ComponentId> = self.state.z_order().to_vec();
        log::debug!("tearing down {} component(s)", ids.len());
        for id in ids.into_iter().rev() {
            self.remove(id);
        }
        self.registry.cleanup_all();
        self.inbox.lock().clear();
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        self.teardown();
    }
}
