//! # Vellum widgets
//!
//! Concrete components built on `vellum-core`:
//!
//! - [`TextInput`]: multi-line or single-line text editing with word wrap,
//!   selection, undo/redo, clipboard and auto-scroll,
//! - [`ScrollView`]: a scrollable window onto owned children, with
//!   draggable scrollbars,
//! - [`Navigator`]: tabbed pages behind a strip of headers,
//! - [`Panel`], [`Label`] and [`Button`].
//!
//! Containers own their children and forward input to them; see
//! [`container`] for the routing rules.
//!
//! ```rust
//! use std::rc::Rc;
//! use vellum_core::*;
//! use vellum_core::headless::{MonospaceMeasure, RecordingSurface};
//! use vellum_ui::*;
//!
//! let mut ui = Ui::with_defaults();
//! let mut form = Panel::new(Bounds::new(0.0, 0.0, 400.0, 300.0));
//! form.add_child(TextInput::new(
//!     Bounds::new(10.0, 60.0, 380.0, 200.0),
//!     Rc::new(MonospaceMeasure::default()),
//! ));
//! form.add_child(Button::new(Bounds::new(10.0, 10.0, 100.0, 40.0), "Send"));
//! ui.add(form, Some("form"));
//!
//! ui.handle_press(50.0, 100.0);
//! ui.handle_release(50.0, 100.0);
//! ui.handle_text("hello");
//!
//! let mut renderer = Renderer::new(Box::new(RecordingSurface::new()));
//! ui.render(&mut renderer);
//! ```

pub mod container;
pub mod navigator;
pub mod scroll;
pub mod textfield;
pub mod widgets;

pub use container::ChildList;
pub use navigator::{Navigator, NavigatorConfig, Tab, TabPosition, TabStyle};
pub use scroll::{ScrollConfig, ScrollDirection, ScrollView};
pub use textfield::{TextInput, TextInputConfig};
pub use widgets::{Button, Label, Panel};
