//! # Vellum core
//!
//! A retained-mode component toolkit that draws through an immediate-mode
//! surface owned by the host. The host supplies three things:
//!
//! - a [`DrawSurface`] (rectangles, triangles, lines, text, textures,
//!   scissor) wrapped in a [`Renderer`],
//! - a [`ThemeSource`] answering color tokens,
//! - decoded input in UI coordinates (origin bottom-left, y up).
//!
//! Everything else lives here: components and their handler tables, the
//! routing state machine ([`UiState`]), the name registry, the layout
//! manager, and the [`Ui`] context tying them together.
//!
//! ## A minimal frame loop
//!
//! ```rust
//! use vellum_core::*;
//! use vellum_core::headless::RecordingSurface;
//!
//! struct Swatch {
//!     base: ComponentBase,
//! }
//!
//! impl Component for Swatch {
//!     fn base(&self) -> &ComponentBase { &self.base }
//!     fn base_mut(&mut self) -> &mut ComponentBase { &mut self.base }
//!     fn render(&mut self, r: &mut Renderer) -> anyhow::Result<()> {
//!         let s = &self.base.style;
//!         r.draw_rounded_rect(self.base.bounds, s.corner_radius, s.background_for(self.base.interaction()));
//!         Ok(())
//!     }
//! }
//!
//! let mut ui = Ui::with_defaults();
//! let mut swatch = Swatch { base: ComponentBase::new(Bounds::new(10.0, 10.0, 50.0, 50.0)) };
//! swatch.base.add_event_handler(EventType::Click, |base, _evt, ctx| {
//!     base.style.corner_radius = 8.0;
//!     ctx.request_redraw();
//!     Ok(true)
//! });
//! let id = ui.add(swatch, None);
//!
//! ui.resize(800.0, 600.0);
//! ui.handle_press(20.0, 20.0);
//! ui.handle_release(20.0, 20.0);
//! assert!(ui.tick());
//!
//! let mut renderer = Renderer::new(Box::new(RecordingSurface::new()));
//! ui.render(&mut renderer);
//! assert_eq!(ui.get(id).unwrap().base().style.corner_radius, 8.0);
//! ```
//!
//! ## Background work
//!
//! `Ui` is not `Send`. Other threads talk to it through a [`Mailbox`]:
//!
//! ```rust
//! use vellum_core::*;
//!
//! let mut ui = Ui::with_defaults();
//! let mailbox = ui.mailbox();
//! std::thread::spawn(move || {
//!     let _ = mailbox.post(|state| state.request_redraw());
//! })
//! .join()
//! .unwrap();
//! assert_eq!(ui.poll(), 1);
//! ```

pub mod color;
pub mod component;
pub mod context;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod input;
pub mod layout;
pub mod mailbox;
pub mod registry;
pub mod render;
pub mod state;
pub mod style;

pub use color::*;
pub use component::*;
pub use context::*;
pub use error::*;
pub use geometry::*;
pub use input::*;
pub use layout::*;
pub use mailbox::Mailbox;
pub use registry::*;
pub use render::*;
pub use state::*;
pub use style::*;
