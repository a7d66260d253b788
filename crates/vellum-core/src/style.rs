//! # Theming and styles
//!
//! Colors come from a host-owned [`ThemeSource`], a flat token → color
//! lookup polled by the UI context. Nothing cascades: each component keeps a
//! [`Style`] value that is resolved once when it is added and again whenever
//! the theme source reports a change.
//!
//! ```rust
//! use vellum_core::*;
//!
//! let mut palette = Palette::default();
//! palette.set(ColorToken::Background, Color::from_hex("#202020"));
//!
//! let style = Style::from_theme(&palette);
//! assert_eq!(style.background, Color::from_hex("#202020"));
//! ```

use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Color;

/// Semantic color keys a theme source can answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorToken {
    Background,
    Text,
    Border,
    HoverBackground,
    FocusBackground,
    FocusBorder,
    PressedBackground,
    PressedBorder,
    DisabledBackground,
    DisabledText,
    Cursor,
    Selection,
    Placeholder,
    ScrollTrack,
    ScrollThumb,
    ScrollThumbActive,
}

impl ColorToken {
    pub const ALL: [ColorToken; 16] = [
        ColorToken::Background,
        ColorToken::Text,
        ColorToken::Border,
        ColorToken::HoverBackground,
        ColorToken::FocusBackground,
        ColorToken::FocusBorder,
        ColorToken::PressedBackground,
        ColorToken::PressedBorder,
        ColorToken::DisabledBackground,
        ColorToken::DisabledText,
        ColorToken::Cursor,
        ColorToken::Selection,
        ColorToken::Placeholder,
        ColorToken::ScrollTrack,
        ColorToken::ScrollThumb,
        ColorToken::ScrollThumbActive,
    ];
}

/// Host-side color provider.
pub trait ThemeSource {
    /// `None` means the token is unknown; callers fall back to [`Palette::default`].
    fn get_color(&self, token: ColorToken) -> Option<Color>;

    /// Reports (and consumes) a pending theme change.
    fn has_theme_changed(&self) -> bool;
}

/// Looks `token` up in `theme`, falling back to the built-in palette.
pub fn resolve_color(theme: &dyn ThemeSource, token: ColorToken) -> Color {
    match theme.get_color(token) {
        Some(c) => c,
        None => {
            log::debug!("theme has no {:?}; using built-in default", token);
            Palette::builtin(token)
        }
    }
}

/// In-process theme source backed by a map. Setting a color flags a change
/// that the next `has_theme_changed` call reports once.
#[derive(Debug)]
pub struct Palette {
    colors: HashMap<ColorToken, Color>,
    changed: Cell<bool>,
}

impl Default for Palette {
    fn default() -> Self {
        let colors = ColorToken::ALL
            .iter()
            .map(|&t| (t, Palette::builtin(t)))
            .collect();
        Self {
            colors,
            changed: Cell::new(false),
        }
    }
}

impl Palette {
    /// An empty palette: every lookup falls through to the built-in colors.
    pub fn empty() -> Self {
        Self {
            colors: HashMap::new(),
            changed: Cell::new(false),
        }
    }

    pub fn set(&mut self, token: ColorToken, color: Color) {
        if self.colors.insert(token, color) != Some(color) {
            self.changed.set(true);
        }
    }

    pub fn remove(&mut self, token: ColorToken) {
        if self.colors.remove(&token).is_some() {
            self.changed.set(true);
        }
    }

    pub fn builtin(token: ColorToken) -> Color {
        match token {
            ColorToken::Background => Color::from_f32(0.2, 0.2, 0.2, 0.8),
            ColorToken::Text => Color::WHITE,
            ColorToken::Border => Color::from_f32(0.6, 0.6, 0.6, 1.0),
            ColorToken::HoverBackground => Color::from_f32(0.25, 0.25, 0.25, 0.85),
            ColorToken::FocusBackground => Color::from_f32(0.3, 0.3, 0.3, 0.9),
            ColorToken::FocusBorder => Color::from_f32(0.4, 0.6, 0.9, 1.0),
            ColorToken::PressedBackground => Color::from_f32(0.15, 0.15, 0.15, 1.0),
            ColorToken::PressedBorder => Color::from_f32(0.4, 0.6, 0.9, 1.0),
            ColorToken::DisabledBackground => Color::from_f32(0.18, 0.18, 0.18, 0.6),
            ColorToken::DisabledText => Color::from_f32(0.5, 0.5, 0.5, 1.0),
            ColorToken::Cursor => Color::WHITE,
            ColorToken::Selection => Color::from_f32(0.3, 0.5, 0.8, 0.5),
            ColorToken::Placeholder => Color::from_f32(0.6, 0.6, 0.6, 0.8),
            ColorToken::ScrollTrack => Color::from_f32(0.3, 0.3, 0.3, 0.8),
            ColorToken::ScrollThumb => Color::from_f32(0.72, 0.72, 0.72, 0.9),
            ColorToken::ScrollThumbActive => Color::from_f32(0.4, 0.6, 0.9, 1.0),
        }
    }
}

impl ThemeSource for Palette {
    fn get_color(&self, token: ColorToken) -> Option<Color> {
        self.colors.get(&token).copied()
    }

    fn has_theme_changed(&self) -> bool {
        self.changed.replace(false)
    }
}

/// Interaction state used to pick per-state colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Hovered,
    Focused,
    Pressed,
    Disabled,
}

/// Flat visual record for one component.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub background: Color,
    pub text: Color,
    pub border: Color,
    pub hover_background: Color,
    pub focus_background: Color,
    pub focus_border: Color,
    pub pressed_background: Color,
    pub pressed_border: Color,
    pub disabled_background: Color,
    pub disabled_text: Color,
    pub cursor: Color,
    pub selection: Color,
    pub placeholder: Color,

    pub font_size: f32,
    pub padding: f32,
    pub border_width: f32,
    pub corner_radius: f32,
}

impl Default for Style {
    fn default() -> Self {
        let b = Palette::builtin;
        Self {
            background: b(ColorToken::Background),
            text: b(ColorToken::Text),
            border: b(ColorToken::Border),
            hover_background: b(ColorToken::HoverBackground),
            focus_background: b(ColorToken::FocusBackground),
            focus_border: b(ColorToken::FocusBorder),
            pressed_background: b(ColorToken::PressedBackground),
            pressed_border: b(ColorToken::PressedBorder),
            disabled_background: b(ColorToken::DisabledBackground),
            disabled_text: b(ColorToken::DisabledText),
            cursor: b(ColorToken::Cursor),
            selection: b(ColorToken::Selection),
            placeholder: b(ColorToken::Placeholder),
            font_size: 11.0,
            padding: 10.0,
            border_width: 1.0,
            corner_radius: 0.0,
        }
    }
}

impl Style {
    /// Default metrics with every color pulled from `theme`.
    pub fn from_theme(theme: &dyn ThemeSource) -> Self {
        let mut s = Style::default();
        s.apply_theme(theme);
        s
    }

    /// Re-derives the colors from `theme`, keeping metrics untouched.
    pub fn apply_theme(&mut self, theme: &dyn ThemeSource) {
        let c = |t| resolve_color(theme, t);
        self.background = c(ColorToken::Background);
        self.text = c(ColorToken::Text);
        self.border = c(ColorToken::Border);
        self.hover_background = c(ColorToken::HoverBackground);
        self.focus_background = c(ColorToken::FocusBackground);
        self.focus_border = c(ColorToken::FocusBorder);
        self.pressed_background = c(ColorToken::PressedBackground);
        self.pressed_border = c(ColorToken::PressedBorder);
        self.disabled_background = c(ColorToken::DisabledBackground);
        self.disabled_text = c(ColorToken::DisabledText);
        self.cursor = c(ColorToken::Cursor);
        self.selection = c(ColorToken::Selection);
        self.placeholder = c(ColorToken::Placeholder);
    }

    pub fn background_for(&self, state: Interaction) -> Color {
        match state {
            Interaction::Idle => self.background,
            Interaction::Hovered => self.hover_background,
            Interaction::Focused => self.focus_background,
            Interaction::Pressed => self.pressed_background,
            Interaction::Disabled => self.disabled_background,
        }
    }

    pub fn border_for(&self, state: Interaction) -> Color {
        match state {
            Interaction::Focused => self.focus_border,
            Interaction::Pressed => self.pressed_border,
            _ => self.border,
        }
    }

    pub fn text_for(&self, state: Interaction) -> Color {
        match state {
            Interaction::Disabled => self.disabled_text,
            _ => self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_falls_back() {
        let theme = Palette::empty();
        let s = Style::from_theme(&theme);
        assert_eq!(s.background, Palette::builtin(ColorToken::Background));
        assert_eq!(s.text, Color::WHITE);
    }

    #[test]
    fn test_change_flag_is_consumed() {
        let mut p = Palette::default();
        assert!(!p.has_theme_changed());
        p.set(ColorToken::Text, Color::BLACK);
        assert!(p.has_theme_changed());
        assert!(!p.has_theme_changed());
        // Same value again is not a change.
        p.set(ColorToken::Text, Color::BLACK);
        assert!(!p.has_theme_changed());
    }

    #[test]
    fn test_apply_theme_keeps_metrics() {
        let mut s = Style {
            font_size: 18.0,
            padding: 4.0,
            ..Style::default()
        };
        let mut p = Palette::default();
        p.set(ColorToken::Border, Color::from_hex("#ff0000"));
        s.apply_theme(&p);
        assert_eq!(s.border, Color(255, 0, 0, 255));
        assert_eq!(s.font_size, 18.0);
        assert_eq!(s.padding, 4.0);
    }

    #[test]
    fn test_style_from_partial_json() {
        let s: Style = serde_json::from_str(r#"{ "font_size": 14.0, "corner_radius": 6.0 }"#)
            .expect("style json");
        assert_eq!(s.font_size, 14.0);
        assert_eq!(s.corner_radius, 6.0);
        assert_eq!(s.padding, 10.0);
    }
}
