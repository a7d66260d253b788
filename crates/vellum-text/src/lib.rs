//! Shaped text measurement for Vellum, backed by `cosmic-text`.
//!
//! [`CosmicMeasure`] implements [`TextMeasure`] so hosts without a
//! measuring surface of their own (and widgets that need caret positions)
//! get real advances instead of a fixed-width estimate.
//!
//! The font system is owned by the measurer. Nothing here is global; a host
//! that wants one shared instance wraps it in an `Rc`.

use std::cell::RefCell;

use ahash::AHashMap;
use cosmic_text::{Attrs, Buffer, FontSystem, Metrics, Shaping};
use unicode_segmentation::UnicodeSegmentation;
use vellum_core::{Size, TextMeasure};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.3;

const CACHE_LIMIT: usize = 4096;

type Key = (String, u32);

pub struct CosmicMeasure {
    fs: RefCell<FontSystem>,
    sizes: RefCell<AHashMap<Key, Size>>,
    carets: RefCell<AHashMap<Key, Vec<f32>>>,
}

/// One shaped glyph cluster: byte range and horizontal extent.
#[derive(Clone, Copy, Debug)]
struct Cluster {
    start: usize,
    end: usize,
    x: f32,
    w: f32,
}

/// Shaped layout of a single unwrapped string.
struct Shaped {
    width: f32,
    lines: usize,
    clusters: Vec<Cluster>,
}

impl Default for CosmicMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl CosmicMeasure {
    /// Loads the system font database.
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(fs: FontSystem) -> Self {
        Self {
            fs: RefCell::new(fs),
            sizes: RefCell::default(),
            carets: RefCell::default(),
        }
    }

    /// Adds a font from memory and drops cached measurements.
    pub fn load_font_data(&self, data: Vec<u8>) {
        self.fs.borrow_mut().db_mut().load_font_data(data);
        self.clear_cache();
    }

    pub fn clear_cache(&self) {
        self.sizes.borrow_mut().clear();
        self.carets.borrow_mut().clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.sizes.borrow().len() + self.carets.borrow().len()
    }

    fn shape(&self, text: &str, px: f32) -> Shaped {
        let mut fs = self.fs.borrow_mut();
        let mut buf = Buffer::new(&mut fs, Metrics::new(px, px * LINE_HEIGHT_FACTOR));
        {
            let mut b = buf.borrow_with(&mut fs);
            b.set_size(None, None);
            b.set_text(text, &Attrs::new(), Shaping::Advanced, None);
            b.shape_until_scroll(true);
        }

        let mut width = 0.0f32;
        let mut lines = 0;
        let mut clusters = Vec::new();
        for run in buf.layout_runs() {
            lines += 1;
            width = width.max(run.line_w);
            for g in run.glyphs {
                clusters.push(Cluster {
                    start: g.start,
                    end: g.end,
                    x: g.x,
                    w: g.w,
                });
            }
        }
        Shaped {
            width,
            lines: lines.max(1),
            clusters,
        }
    }
}

/// X of the caret before byte `b`, interpolating inside ligatures.
fn x_at_byte(clusters: &[Cluster], b: usize) -> f32 {
    let mut best = 0.0f32;
    for c in clusters {
        if b >= c.end {
            best = best.max(c.x + c.w);
        } else if b > c.start {
            let t = (b - c.start) as f32 / (c.end - c.start) as f32;
            best = best.max(c.x + c.w * t);
        }
    }
    best
}

/// One stop per char plus the end. Chars inside a grapheme cluster share
/// the cluster's starting stop so the caret never splits one visually.
fn caret_stops(text: &str, clusters: &[Cluster]) -> Vec<f32> {
    let mut out = Vec::with_capacity(text.chars().count() + 1);
    for (start, grapheme) in text.grapheme_indices(true) {
        let x = x_at_byte(clusters, start);
        out.extend(std::iter::repeat_n(x, grapheme.chars().count()));
    }
    let end = x_at_byte(clusters, text.len());
    out.push(end);
    // Shaping can reorder clusters; stops must never run backwards.
    for i in 1..out.len() {
        if out[i] < out[i - 1] {
            out[i] = out[i - 1];
        }
    }
    out
}

fn insert_bounded<V>(map: &mut AHashMap<Key, V>, key: Key, value: V) {
    if map.len() >= CACHE_LIMIT {
        log::debug!("text measure cache full; clearing {} entries", map.len());
        map.clear();
    }
    map.insert(key, value);
}

impl TextMeasure for CosmicMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Size {
        let line_h = font_size * LINE_HEIGHT_FACTOR;
        if text.is_empty() {
            return Size::new(0.0, line_h);
        }
        let key = (text.to_string(), font_size.to_bits());
        if let Some(s) = self.sizes.borrow().get(&key) {
            return *s;
        }
        let shaped = self.shape(text, font_size);
        let size = Size::new(shaped.width, shaped.lines as f32 * line_h);
        insert_bounded(&mut self.sizes.borrow_mut(), key, size);
        size
    }

    fn caret_positions(&self, text: &str, font_size: f32) -> Vec<f32> {
        if text.is_empty() {
            return vec![0.0];
        }
        let key = (text.to_string(), font_size.to_bits());
        if let Some(p) = self.carets.borrow().get(&key) {
            return p.clone();
        }
        let shaped = self.shape(text, font_size);
        let stops = caret_stops(text, &shaped.clusters);
        insert_bounded(&mut self.carets.borrow_mut(), key, stops.clone());
        stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(start: usize, end: usize, x: f32, w: f32) -> Cluster {
        Cluster { start, end, x, w }
    }

    #[test]
    fn test_caret_stops_per_char() {
        let clusters = [
            cluster(0, 1, 0.0, 5.0),
            cluster(1, 2, 5.0, 6.0),
            cluster(2, 3, 11.0, 4.0),
        ];
        assert_eq!(caret_stops("abc", &clusters), vec![0.0, 5.0, 11.0, 15.0]);
    }

    #[test]
    fn test_ligature_is_interpolated() {
        // "ffi" shaped as one glyph 12 px wide.
        let clusters = [cluster(0, 3, 0.0, 12.0)];
        assert_eq!(caret_stops("ffi", &clusters), vec![0.0, 4.0, 8.0, 12.0]);
    }

    #[test]
    fn test_grapheme_cluster_shares_one_stop() {
        // "e" + combining acute (2 bytes), then "x".
        let text = "e\u{301}x";
        let clusters = [cluster(0, 3, 0.0, 7.0), cluster(3, 4, 7.0, 6.0)];
        let stops = caret_stops(text, &clusters);
        assert_eq!(stops.len(), text.chars().count() + 1);
        assert_eq!(stops, vec![0.0, 0.0, 7.0, 13.0]);
    }

    #[test]
    fn test_stops_never_run_backwards() {
        let clusters = [cluster(0, 1, 10.0, 5.0), cluster(1, 2, 0.0, 5.0)];
        let stops = caret_stops("ab", &clusters);
        assert!(stops.windows(2).all(|w| w[0] <= w[1]), "{stops:?}");
    }

    #[test]
    fn test_measure_with_font_system() {
        let m = CosmicMeasure::new();
        let empty = m.measure("", 16.0);
        assert_eq!(empty.width, 0.0);
        assert_eq!(m.caret_positions("", 16.0), vec![0.0]);

        let a = m.measure("hello", 16.0);
        let b = m.measure("hello", 16.0);
        assert_eq!(a, b);
        assert_eq!(m.cached_entries(), 1);

        let stops = m.caret_positions("hello", 16.0);
        assert_eq!(stops.len(), 6);
        assert!((stops[5] - a.width).abs() < 0.5);

        m.clear_cache();
        assert_eq!(m.cached_entries(), 0);
    }
}
