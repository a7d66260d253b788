//! # Rendering
//!
//! Components never talk to the host directly. They draw through a
//! [`Renderer`], which owns the host's [`DrawSurface`], converts UI-space
//! coordinates (bottom-left origin) into host space, tessellates rounded
//! shapes, and keeps a clip stack mirrored into the host scissor.
//!
//! A frame is bracketed by [`Renderer::begin_pass`]. The returned guard
//! unwinds whatever clip regions are still pushed when it drops, so a
//! component that bails out half-way through a nested clip cannot leak a
//! scissor into the next frame.

use ahash::AHashMap;
use std::cell::RefCell;
use std::f32::consts::{FRAC_PI_2, PI};
use std::ops::{Deref, DerefMut};

use crate::{Bounds, Color, Size, Vec2};

/// Host-side handle to an uploaded texture.
pub type TextureId = u64;

/// Text measurement, shared by the renderer and by components that need
/// to lay text out while handling input.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Size;

    /// X offset of every caret stop in `text`, one per char plus the end.
    /// The default measures each prefix, which is correct but slow; shaping
    /// backends override it.
    fn caret_positions(&self, text: &str, font_size: f32) -> Vec<f32> {
        let mut out = Vec::with_capacity(text.chars().count() + 1);
        out.push(0.0);
        for (i, ch) in text.char_indices() {
            let end = i + ch.len_utf8();
            out.push(self.measure(&text[..end], font_size).width);
        }
        out
    }
}

/// The host's immediate-mode drawing API, in host coordinates.
pub trait DrawSurface: TextMeasure {
    fn fill_rect(&mut self, rect: Bounds, color: Color);

    /// Triangle list; every three vertices form one triangle.
    fn fill_triangles(&mut self, vertices: &[Vec2], color: Color);

    fn draw_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);

    /// `origin` is the left end of the text baseline box.
    fn draw_text(&mut self, text: &str, origin: Vec2, font_size: f32, color: Color);

    /// Returns `false` when the texture is unknown to the host.
    fn draw_texture(&mut self, texture: TextureId, rect: Bounds, tint: Color) -> bool;

    /// `None` disables scissoring.
    fn set_scissor(&mut self, rect: Option<Bounds>);
}

/// Maps UI space into host space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceTransform {
    pub offset: Vec2,
    /// Host surface height for y-down hosts; `None` for y-up hosts.
    pub flip_height: Option<f32>,
}

impl SurfaceTransform {
    pub fn y_down(height: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            flip_height: Some(height),
        }
    }

    pub fn map_point(&self, p: Vec2) -> Vec2 {
        let x = p.x + self.offset.x;
        let y = p.y + self.offset.y;
        match self.flip_height {
            Some(h) => Vec2::new(x, h - y),
            None => Vec2::new(x, y),
        }
    }

    pub fn map_rect(&self, r: Bounds) -> Bounds {
        let x = r.x + self.offset.x;
        let y = r.y + self.offset.y;
        let y = match self.flip_height {
            Some(h) => h - (y + r.height),
            None => y,
        };
        Bounds {
            x,
            y,
            width: r.width,
            height: r.height,
        }
    }
}

/// Output of the rounded-shape tessellators, in UI space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tessellation {
    pub rects: Vec<Bounds>,
    /// Triangle list.
    pub triangles: Vec<Vec2>,
}

fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds {
    Bounds {
        x,
        y,
        width: w.max(0.0),
        height: h.max(0.0),
    }
}

/// Corner centres with the start angle of their quarter arc, counter-clockwise
/// from bottom-left.
fn corners(b: Bounds, r: f32) -> [(Vec2, f32); 4] {
    [
        (Vec2::new(b.x + r, b.y + r), PI),
        (Vec2::new(b.right() - r, b.y + r), PI + FRAC_PI_2),
        (Vec2::new(b.right() - r, b.top() - r), 0.0),
        (Vec2::new(b.x + r, b.top() - r), FRAC_PI_2),
    ]
}

fn arc_point(c: Vec2, r: f32, a: f32) -> Vec2 {
    Vec2::new(c.x + r * a.cos(), c.y + r * a.sin())
}

/// Three rectangles plus a triangle fan per corner.
pub fn rounded_rect_fill(b: Bounds, radius: f32, segments: usize) -> Tessellation {
    let r = radius.clamp(0.0, b.width.min(b.height) / 2.0);
    if r <= 0.0 {
        return Tessellation {
            rects: vec![b],
            triangles: Vec::new(),
        };
    }
    let segments = segments.max(1);
    let rects = vec![
        rect(b.x + r, b.y, b.width - 2.0 * r, b.height),
        rect(b.x, b.y + r, r, b.height - 2.0 * r),
        rect(b.right() - r, b.y + r, r, b.height - 2.0 * r),
    ];
    let mut triangles = Vec::with_capacity(4 * segments * 3);
    let step = FRAC_PI_2 / segments as f32;
    for (c, start) in corners(b, r) {
        for i in 0..segments {
            let a0 = start + step * i as f32;
            let a1 = start + step * (i + 1) as f32;
            triangles.push(c);
            triangles.push(arc_point(c, r, a0));
            triangles.push(arc_point(c, r, a1));
        }
    }
    Tessellation { rects, triangles }
}

/// Four edge rectangles plus an annulus strip per corner. With no inner
/// radius left the strip collapses to a fan.
pub fn rounded_rect_outline(b: Bounds, radius: f32, width: f32, segments: usize) -> Tessellation {
    let r = radius.clamp(0.0, b.width.min(b.height) / 2.0);
    let bw = width.clamp(0.0, b.width.min(b.height) / 2.0);
    if bw <= 0.0 {
        return Tessellation::default();
    }
    if r <= 0.0 {
        return Tessellation {
            rects: vec![
                rect(b.x, b.y, b.width, bw),
                rect(b.x, b.top() - bw, b.width, bw),
                rect(b.x, b.y + bw, bw, b.height - 2.0 * bw),
                rect(b.right() - bw, b.y + bw, bw, b.height - 2.0 * bw),
            ],
            triangles: Vec::new(),
        };
    }
    let rects = vec![
        rect(b.x + r, b.y, b.width - 2.0 * r, bw),
        rect(b.x + r, b.top() - bw, b.width - 2.0 * r, bw),
        rect(b.x, b.y + r, bw, b.height - 2.0 * r),
        rect(b.right() - bw, b.y + r, bw, b.height - 2.0 * r),
    ];
    let segments = segments.max(1);
    let inner = (r - bw).max(0.0);
    let step = FRAC_PI_2 / segments as f32;
    let mut triangles = Vec::with_capacity(4 * segments * 6);
    for (c, start) in corners(b, r) {
        for i in 0..segments {
            let a0 = start + step * i as f32;
            let a1 = start + step * (i + 1) as f32;
            let o0 = arc_point(c, r, a0);
            let o1 = arc_point(c, r, a1);
            if inner <= 0.0 {
                triangles.extend_from_slice(&[c, o0, o1]);
            } else {
                let i0 = arc_point(c, inner, a0);
                let i1 = arc_point(c, inner, a1);
                triangles.extend_from_slice(&[o0, o1, i0, i0, o1, i1]);
            }
        }
    }
    Tessellation { rects, triangles }
}

const MEASURE_CACHE_LIMIT: usize = 4096;

pub struct Renderer {
    surface: Box<dyn DrawSurface>,
    transform: SurfaceTransform,
    clip_stack: Vec<Bounds>,
    pub fill_segments: usize,
    pub outline_segments: usize,
    pub placeholder_color: Color,
    measure_cache: RefCell<AHashMap<(String, u32), Size>>,
}

impl Renderer {
    pub fn new(surface: Box<dyn DrawSurface>) -> Self {
        Self::with_transform(surface, SurfaceTransform::default())
    }

    pub fn with_transform(surface: Box<dyn DrawSurface>, transform: SurfaceTransform) -> Self {
        Self {
            surface,
            transform,
            clip_stack: Vec::new(),
            fill_segments: 8,
            outline_segments: 12,
            placeholder_color: Color::from_rgba(128, 128, 128, 160),
            measure_cache: RefCell::new(AHashMap::new()),
        }
    }

    pub fn transform(&self) -> SurfaceTransform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: SurfaceTransform) {
        self.transform = transform;
    }

    pub fn surface_mut(&mut self) -> &mut dyn DrawSurface {
        self.surface.as_mut()
    }

    /// Starts a frame. Dropping the guard closes every clip region left open.
    pub fn begin_pass(&mut self) -> RenderPass<'_> {
        if !self.clip_stack.is_empty() {
            log::warn!(
                "begin_pass with {} clip region(s) still pushed; discarding",
                self.clip_stack.len()
            );
            self.clip_stack.clear();
            self.surface.set_scissor(None);
        }
        RenderPass { renderer: self }
    }

    // ---- clipping ----

    pub fn current_clip(&self) -> Option<Bounds> {
        self.clip_stack.last().copied()
    }

    pub fn clip_depth(&self) -> usize {
        self.clip_stack.len()
    }

    /// Pushes `region` intersected with the current clip.
    pub fn push_clip_rect(&mut self, region: Bounds) {
        let clip = match self.current_clip() {
            Some(parent) => parent.intersect(&region),
            None => region,
        };
        self.clip_stack.push(clip);
        self.surface
            .set_scissor(Some(self.transform.map_rect(clip)));
    }

    pub fn pop_clip_rect(&mut self) {
        if self.clip_stack.pop().is_none() {
            log::warn!("pop_clip_rect on an empty clip stack");
            return;
        }
        let scissor = self.current_clip().map(|c| self.transform.map_rect(c));
        self.surface.set_scissor(scissor);
    }

    /// Pops back down to `depth`, logging if anything had to be discarded.
    pub fn restore_clip_depth(&mut self, depth: usize) {
        if self.clip_stack.len() > depth {
            log::warn!(
                "discarding {} unbalanced clip region(s)",
                self.clip_stack.len() - depth
            );
            while self.clip_stack.len() > depth {
                self.pop_clip_rect();
            }
        }
    }

    pub fn is_point_clipped(&self, x: f32, y: f32) -> bool {
        match self.current_clip() {
            Some(c) => !c.contains_point(x, y),
            None => false,
        }
    }

    pub fn is_rect_clipped(&self, r: &Bounds) -> bool {
        match self.current_clip() {
            Some(c) => c.is_empty() || !c.intersects(r),
            None => false,
        }
    }

    fn suppressed(&self) -> bool {
        matches!(self.current_clip(), Some(c) if c.is_empty())
    }

    // ---- primitives ----

    pub fn draw_rect(&mut self, r: Bounds, color: Color) {
        if r.is_empty() || self.is_rect_clipped(&r) {
            return;
        }
        self.surface.fill_rect(self.transform.map_rect(r), color);
    }

    pub fn draw_rect_outline(&mut self, r: Bounds, width: f32, color: Color) {
        self.emit(rounded_rect_outline(r, 0.0, width, 1), r, color);
    }

    pub fn draw_rounded_rect(&mut self, r: Bounds, radius: f32, color: Color) {
        self.emit(rounded_rect_fill(r, radius, self.fill_segments), r, color);
    }

    pub fn draw_rounded_rect_outline(&mut self, r: Bounds, radius: f32, width: f32, color: Color) {
        self.emit(
            rounded_rect_outline(r, radius, width, self.outline_segments),
            r,
            color,
        );
    }

    fn emit(&mut self, tess: Tessellation, extent: Bounds, color: Color) {
        if extent.is_empty() || self.is_rect_clipped(&extent) {
            return;
        }
        for r in tess.rects.into_iter().filter(|r| !r.is_empty()) {
            self.surface.fill_rect(self.transform.map_rect(r), color);
        }
        if !tess.triangles.is_empty() {
            let t = self.transform;
            let verts: Vec<Vec2> = tess.triangles.into_iter().map(|p| t.map_point(p)).collect();
            self.surface.fill_triangles(&verts, color);
        }
    }

    pub fn draw_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        if self.suppressed() {
            return;
        }
        let (a, b) = (self.transform.map_point(from), self.transform.map_point(to));
        self.surface.draw_line(a, b, width, color);
    }

    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: Color) {
        if text.is_empty() || self.suppressed() {
            return;
        }
        let origin = self.transform.map_point(Vec2::new(x, y));
        self.surface.draw_text(text, origin, font_size, color);
    }

    /// Draws `texture`, or a flat placeholder if there is none or the host
    /// does not know it.
    pub fn draw_textured_rect(&mut self, texture: Option<TextureId>, r: Bounds, tint: Color) {
        if r.is_empty() || self.is_rect_clipped(&r) {
            return;
        }
        let mapped = self.transform.map_rect(r);
        let drawn = match texture {
            Some(t) => self.surface.draw_texture(t, mapped, tint),
            None => false,
        };
        if !drawn {
            log::debug!("texture {:?} unavailable; drawing placeholder", texture);
            self.surface.fill_rect(mapped, self.placeholder_color);
        }
    }

    // ---- text ----

    pub fn measure_text(&self, text: &str, font_size: f32) -> Size {
        let key = (text.to_string(), font_size.to_bits());
        if let Some(s) = self.measure_cache.borrow().get(&key) {
            return *s;
        }
        let size = self.surface.measure(text, font_size);
        let mut cache = self.measure_cache.borrow_mut();
        if cache.len() >= MEASURE_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(key, size);
        size
    }

    pub fn clear_caches(&mut self) {
        self.measure_cache.borrow_mut().clear();
    }
}

impl TextMeasure for Renderer {
    fn measure(&self, text: &str, font_size: f32) -> Size {
        self.measure_text(text, font_size)
    }

    fn caret_positions(&self, text: &str, font_size: f32) -> Vec<f32> {
        self.surface.caret_positions(text, font_size)
    }
}

/// A frame in progress. Derefs to the [`Renderer`].
pub struct RenderPass<'a> {
    renderer: &'a mut Renderer,
}

impl Deref for RenderPass<'_> {
    type Target = Renderer;

    fn deref(&self) -> &Renderer {
        self.renderer
    }
}

impl DerefMut for RenderPass<'_> {
    fn deref_mut(&mut self) -> &mut Renderer {
        self.renderer
    }
}

impl Drop for RenderPass<'_> {
    fn drop(&mut self) {
        let open = self.renderer.clip_stack.len();
        if open > 0 {
            log::warn!(
                "render pass ended with {} clip region(s) still pushed",
                open
            );
            self.renderer.clip_stack.clear();
        }
        self.renderer.surface.set_scissor(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{DrawOp, RecordingSurface};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_rounded_fill_counts() {
        let t = rounded_rect_fill(Bounds::new(0.0, 0.0, 100.0, 40.0), 8.0, 8);
        assert_eq!(t.rects.len(), 3);
        assert_eq!(t.triangles.len(), 4 * 8 * 3);
    }

    #[test]
    fn test_radius_clamped_to_half_short_side() {
        let t = rounded_rect_fill(Bounds::new(0.0, 0.0, 100.0, 20.0), 50.0, 4);
        // Centre strip spans the full height and the side strips vanish.
        assert!(approx(t.rects[0].height, 20.0));
        assert!(approx(t.rects[1].height, 0.0));
        for p in &t.triangles {
            assert!(p.y >= -1e-3 && p.y <= 20.0 + 1e-3);
        }
    }

    #[test]
    fn test_outline_degrades_to_fan() {
        let strip = rounded_rect_outline(Bounds::new(0.0, 0.0, 50.0, 50.0), 10.0, 2.0, 12);
        assert_eq!(strip.rects.len(), 4);
        assert_eq!(strip.triangles.len(), 4 * 12 * 6);

        let fan = rounded_rect_outline(Bounds::new(0.0, 0.0, 50.0, 50.0), 4.0, 6.0, 12);
        assert_eq!(fan.triangles.len(), 4 * 12 * 3);
    }

    #[test]
    fn test_flip_transform() {
        let t = SurfaceTransform::y_down(100.0);
        assert_eq!(t.map_point(Vec2::new(5.0, 10.0)), Vec2::new(5.0, 90.0));
        assert_eq!(
            t.map_rect(Bounds::new(0.0, 10.0, 20.0, 30.0)),
            Bounds::new(0.0, 60.0, 20.0, 30.0)
        );
    }

    #[test]
    fn test_nested_clip_intersects() {
        let surface = RecordingSurface::new();
        let ops = surface.ops();
        let mut r = Renderer::new(Box::new(surface));
        r.push_clip_rect(Bounds::new(0.0, 0.0, 100.0, 100.0));
        r.push_clip_rect(Bounds::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(r.current_clip(), Some(Bounds::new(50.0, 50.0, 50.0, 50.0)));
        assert!(r.is_point_clipped(10.0, 10.0));
        assert!(!r.is_point_clipped(60.0, 60.0));
        r.pop_clip_rect();
        assert_eq!(r.current_clip(), Some(Bounds::new(0.0, 0.0, 100.0, 100.0)));
        r.pop_clip_rect();
        assert_eq!(r.clip_depth(), 0);
        assert_eq!(ops.borrow().last(), Some(&DrawOp::Scissor(None)));
    }

    #[test]
    fn test_disjoint_clip_suppresses_drawing() {
        let surface = RecordingSurface::new();
        let ops = surface.ops();
        let mut r = Renderer::new(Box::new(surface));
        r.push_clip_rect(Bounds::new(0.0, 0.0, 10.0, 10.0));
        r.push_clip_rect(Bounds::new(20.0, 20.0, 10.0, 10.0));
        ops.borrow_mut().clear();
        r.draw_rect(Bounds::new(0.0, 0.0, 100.0, 100.0), Color::WHITE);
        r.draw_text("hidden", 0.0, 0.0, 12.0, Color::WHITE);
        r.draw_line(Vec2::ZERO, Vec2::new(5.0, 5.0), 1.0, Color::WHITE);
        assert!(ops.borrow().is_empty());
    }

    #[test]
    fn test_pass_guard_unwinds_clip_stack() {
        let surface = RecordingSurface::new();
        let ops = surface.ops();
        let mut r = Renderer::new(Box::new(surface));
        {
            let mut pass = r.begin_pass();
            pass.push_clip_rect(Bounds::new(0.0, 0.0, 10.0, 10.0));
            pass.push_clip_rect(Bounds::new(0.0, 0.0, 5.0, 5.0));
        }
        assert_eq!(r.clip_depth(), 0);
        assert_eq!(ops.borrow().last(), Some(&DrawOp::Scissor(None)));
    }

    #[test]
    fn test_missing_texture_draws_placeholder() {
        let surface = RecordingSurface::new();
        let ops = surface.ops();
        let mut r = Renderer::new(Box::new(surface));
        let b = Bounds::new(0.0, 0.0, 8.0, 8.0);
        r.draw_textured_rect(Some(42), b, Color::WHITE);
        assert_eq!(
            ops.borrow().as_slice(),
            &[DrawOp::Rect(b, r.placeholder_color)]
        );
    }

    #[test]
    fn test_measure_cache_keys_on_text_and_size() {
        let mut r = Renderer::new(Box::new(RecordingSurface::new()));
        let a = r.measure_text("abc", 10.0);
        assert_eq!(r.measure_text("abc", 10.0), a);
        r.measure_text("abc", 20.0);
        assert_eq!(r.measure_cache.borrow().len(), 2);
        r.clear_caches();
        assert!(r.measure_cache.borrow().is_empty());
    }
}
