//! Host-free backends: a fixed-advance text measurer and a surface that
//! records draw calls. Useful for tests and for hosts that replay frames.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::{Bounds, Color, DrawSurface, Size, TextMeasure, TextureId, Vec2};

/// Every char advances `advance × font_size`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    pub advance: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl MonospaceMeasure {
    /// A measurer where each char is exactly `px` wide regardless of size.
    pub fn fixed(px: f32, font_size: f32) -> Self {
        Self {
            advance: px / font_size,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Size {
        let n = text.chars().count() as f32;
        Size::new(n * self.advance * font_size, font_size)
    }

    fn caret_positions(&self, text: &str, font_size: f32) -> Vec<f32> {
        let w = self.advance * font_size;
        (0..=text.chars().count()).map(|i| i as f32 * w).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Rect(Bounds, Color),
    Triangles(usize, Color),
    Line(Vec2, Vec2, Color),
    Text(String, Vec2, Color),
    Texture(TextureId, Bounds),
    Scissor(Option<Bounds>),
}

/// Records every call into a shared list.
#[derive(Default)]
pub struct RecordingSurface {
    ops: Rc<RefCell<Vec<DrawOp>>>,
    measure: MonospaceMeasure,
    textures: HashSet<TextureId>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_measure(measure: MonospaceMeasure) -> Self {
        Self {
            measure,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.textures.insert(texture);
        self
    }

    /// Handle to the recorded calls, still readable after the surface has
    /// been moved into a renderer.
    pub fn ops(&self) -> Rc<RefCell<Vec<DrawOp>>> {
        self.ops.clone()
    }
}

impl TextMeasure for RecordingSurface {
    fn measure(&self, text: &str, font_size: f32) -> Size {
        self.measure.measure(text, font_size)
    }

    fn caret_positions(&self, text: &str, font_size: f32) -> Vec<f32> {
        self.measure.caret_positions(text, font_size)
    }
}

impl DrawSurface for RecordingSurface {
    fn fill_rect(&mut self, rect: Bounds, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Rect(rect, color));
    }

    fn fill_triangles(&mut self, vertices: &[Vec2], color: Color) {
        self.ops
            .borrow_mut()
            .push(DrawOp::Triangles(vertices.len() / 3, color));
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, _width: f32, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Line(from, to, color));
    }

    fn draw_text(&mut self, text: &str, origin: Vec2, _font_size: f32, color: Color) {
        self.ops
            .borrow_mut()
            .push(DrawOp::Text(text.to_string(), origin, color));
    }

    fn draw_texture(&mut self, texture: TextureId, rect: Bounds, _tint: Color) -> bool {
        if !self.textures.contains(&texture) {
            return false;
        }
        self.ops.borrow_mut().push(DrawOp::Texture(texture, rect));
        true
    }

    fn set_scissor(&mut self, rect: Option<Bounds>) {
        self.ops.borrow_mut().push(DrawOp::Scissor(rect));
    }
}
