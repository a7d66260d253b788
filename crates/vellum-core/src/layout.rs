//! # Layout
//!
//! Layout is driven from the outside: the [`LayoutManager`] keeps named
//! containers, each with a [`LayoutConfig`], an ordered member list and
//! per-member [`LayoutConstraints`]. Running a container computes new bounds
//! for its members and writes them through a [`LayoutTarget`] (normally the
//! [`UiState`]).
//!
//! UI space has its origin at the bottom-left, so "along increasing
//! coordinates" means left to right for rows and bottom to top for columns,
//! stacks and grid rows. Reverse directions mirror the result inside the
//! container.
//!
//! ```rust
//! use std::collections::HashMap;
//! use vellum_core::*;
//!
//! let mut ids = slotmap::SlotMap::<ComponentId, ()>::with_key();
//! let (a, b) = (ids.insert(()), ids.insert(()));
//!
//! let mut boxes: HashMap<ComponentId, Bounds> = HashMap::new();
//! boxes.insert(a, Bounds::new(0.0, 0.0, 50.0, 20.0));
//! boxes.insert(b, Bounds::new(0.0, 0.0, 50.0, 20.0));
//!
//! let mut layout = LayoutManager::new();
//! layout.create_layout("bar", LayoutConfig::horizontal_stack(10.0));
//! layout.add_component("bar", a, LayoutConstraints::default()).unwrap();
//! layout.add_component("bar", b, LayoutConstraints::default()).unwrap();
//! layout
//!     .update_layout("bar", Bounds::new(0.0, 0.0, 200.0, 40.0), &mut boxes)
//!     .unwrap();
//!
//! assert_eq!(boxes[&b].x, 60.0);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::panic_message;
use crate::{Bounds, ComponentId, Insets, Size, UiState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no layout container named {0:?}")]
    UnknownContainer(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutStrategy {
    /// Members are never moved.
    #[default]
    Manual,
    FlexColumn,
    FlexRow,
    Grid,
    Stack,
    Absolute,
    Anchor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlexDirection {
    Row,
    #[default]
    Column,
    RowReverse,
    ColumnReverse,
}

impl FlexDirection {
    pub fn is_row(self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            FlexDirection::RowReverse | FlexDirection::ColumnReverse
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JustifyContent {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignItems {
    Start,
    Center,
    End,
    #[default]
    Stretch,
    /// Treated as `Start`; components expose no baseline.
    Baseline,
}

/// Per-member sizing and placement hints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstraints {
    pub min_width: Option<f32>,
    pub max_width: Option<f32>,
    pub min_height: Option<f32>,
    pub max_height: Option<f32>,

    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Option<f32>,
    pub align_self: Option<AlignItems>,

    pub margin: Insets,

    // Absolute / Anchor offsets from the container's inner edges.
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            min_width: None,
            max_width: None,
            min_height: None,
            max_height: None,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: None,
            align_self: None,
            margin: Insets::ZERO,
            left: None,
            right: None,
            top: None,
            bottom: None,
        }
    }
}

impl LayoutConstraints {
    pub fn grow(flex_grow: f32) -> Self {
        Self {
            flex_grow,
            ..Self::default()
        }
    }

    pub fn clamp_width(&self, w: f32) -> f32 {
        clamp_opt(w, self.min_width, self.max_width)
    }

    pub fn clamp_height(&self, h: f32) -> f32 {
        clamp_opt(h, self.min_height, self.max_height)
    }
}

fn clamp_opt(v: f32, min: Option<f32>, max: Option<f32>) -> f32 {
    let mut v = v;
    if let Some(max) = max {
        v = v.min(max);
    }
    if let Some(min) = min {
        v = v.max(min);
    }
    v.max(0.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub strategy: LayoutStrategy,
    /// Only the reverse flag matters for `FlexRow`/`FlexColumn`.
    pub direction: FlexDirection,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,
    pub padding: Insets,
    pub grid_columns: usize,
    pub grid_rows: Option<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::Manual,
            direction: FlexDirection::Column,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            padding: Insets::ZERO,
            grid_columns: 1,
            grid_rows: None,
        }
    }
}

impl LayoutConfig {
    pub fn vertical_stack(gap: f32) -> Self {
        Self {
            strategy: LayoutStrategy::FlexColumn,
            direction: FlexDirection::Column,
            gap,
            ..Self::default()
        }
    }

    pub fn horizontal_stack(gap: f32) -> Self {
        Self {
            strategy: LayoutStrategy::FlexRow,
            direction: FlexDirection::Row,
            align_items: AlignItems::Center,
            gap,
            ..Self::default()
        }
    }

    pub fn centered_content() -> Self {
        Self {
            strategy: LayoutStrategy::FlexColumn,
            direction: FlexDirection::Column,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..Self::default()
        }
    }

    pub fn toolbar(gap: f32, padding: f32) -> Self {
        Self {
            strategy: LayoutStrategy::FlexRow,
            direction: FlexDirection::Row,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Center,
            gap,
            padding: Insets::uniform(padding),
            ..Self::default()
        }
    }

    pub fn grid(columns: usize, gap: f32) -> Self {
        Self {
            strategy: LayoutStrategy::Grid,
            grid_columns: columns.max(1),
            gap,
            ..Self::default()
        }
    }

    pub fn flex_direction(&self) -> Option<FlexDirection> {
        let reverse = self.direction.is_reverse();
        match (self.strategy, reverse) {
            (LayoutStrategy::FlexRow, false) => Some(FlexDirection::Row),
            (LayoutStrategy::FlexRow, true) => Some(FlexDirection::RowReverse),
            (LayoutStrategy::FlexColumn, false) => Some(FlexDirection::Column),
            (LayoutStrategy::FlexColumn, true) => Some(FlexDirection::ColumnReverse),
            _ => None,
        }
    }
}

/// Where a layout pass reads current bounds from and writes results to.
pub trait LayoutTarget {
    fn bounds_of(&self, id: ComponentId) -> Option<Bounds>;

    /// Natural size used when a member has no flex basis.
    fn preferred_size_of(&self, id: ComponentId) -> Option<Size> {
        self.bounds_of(id).map(|b| b.size())
    }

    fn apply_bounds(&mut self, id: ComponentId, bounds: Bounds);
}

impl LayoutTarget for UiState {
    fn bounds_of(&self, id: ComponentId) -> Option<Bounds> {
        self.get(id).map(|c| c.base().bounds)
    }

    fn preferred_size_of(&self, id: ComponentId) -> Option<Size> {
        self.get(id).map(|c| c.preferred_size())
    }

    fn apply_bounds(&mut self, id: ComponentId, bounds: Bounds) {
        if let Some(c) = self.get_mut(id) {
            if c.base().bounds != bounds {
                c.set_bounds(bounds);
            }
        }
    }
}

impl LayoutTarget for HashMap<ComponentId, Bounds> {
    fn bounds_of(&self, id: ComponentId) -> Option<Bounds> {
        self.get(&id).copied()
    }

    fn apply_bounds(&mut self, id: ComponentId, bounds: Bounds) {
        self.insert(id, bounds);
    }
}

/// One member as seen by a layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutItem {
    pub id: ComponentId,
    pub bounds: Bounds,
    pub preferred: Size,
    pub constraints: LayoutConstraints,
}

fn sized(x: f32, y: f32, w: f32, h: f32) -> Bounds {
    Bounds {
        x,
        y,
        width: w.max(0.0),
        height: h.max(0.0),
    }
}

/// Computes member bounds for `config` inside `container`. Members that
/// the strategy leaves alone are omitted from the result.
pub fn compute_layout(
    config: &LayoutConfig,
    container: Bounds,
    items: &[LayoutItem],
) -> Vec<(ComponentId, Bounds)> {
    if items.is_empty() {
        return Vec::new();
    }
    let inner = container.inset(config.padding);
    match config.strategy {
        LayoutStrategy::Manual => Vec::new(),
        LayoutStrategy::FlexRow | LayoutStrategy::FlexColumn => {
            let dir = config.flex_direction().unwrap_or_default();
            layout_flex(config, dir, inner, items)
        }
        LayoutStrategy::Grid => layout_grid(config, inner, items),
        LayoutStrategy::Stack => layout_stack(config, inner, items),
        LayoutStrategy::Absolute | LayoutStrategy::Anchor => layout_absolute(inner, items),
    }
}

fn layout_flex(
    config: &LayoutConfig,
    dir: FlexDirection,
    inner: Bounds,
    items: &[LayoutItem],
) -> Vec<(ComponentId, Bounds)> {
    let row = dir.is_row();
    let (main_origin, main_avail) = if row {
        (inner.x, inner.width)
    } else {
        (inner.y, inner.height)
    };
    let (cross_origin, cross_avail) = if row {
        (inner.y, inner.height)
    } else {
        (inner.x, inner.width)
    };
    // (start, end) margins on each axis
    let main_margins = |c: &LayoutConstraints| {
        if row {
            (c.margin.left, c.margin.right)
        } else {
            (c.margin.bottom, c.margin.top)
        }
    };
    let cross_margins = |c: &LayoutConstraints| {
        if row {
            (c.margin.bottom, c.margin.top)
        } else {
            (c.margin.left, c.margin.right)
        }
    };
    let clamp_main = |c: &LayoutConstraints, v: f32| {
        if row {
            c.clamp_width(v)
        } else {
            c.clamp_height(v)
        }
    };
    let clamp_cross = |c: &LayoutConstraints, v: f32| {
        if row {
            c.clamp_height(v)
        } else {
            c.clamp_width(v)
        }
    };

    let n = items.len();
    let gaps = config.gap * (n.saturating_sub(1)) as f32;

    let bases: Vec<f32> = items
        .iter()
        .map(|it| {
            let natural = if row {
                it.preferred.width
            } else {
                it.preferred.height
            };
            it.constraints.flex_basis.unwrap_or(natural).max(0.0)
        })
        .collect();
    let margin_total: f32 = items
        .iter()
        .map(|it| {
            let (s, e) = main_margins(&it.constraints);
            s + e
        })
        .sum();
    let free = main_avail - bases.iter().sum::<f32>() - margin_total - gaps;

    let mut sizes = bases.clone();
    if free > 0.0 {
        let total_grow: f32 = items
            .iter()
            .map(|it| it.constraints.flex_grow.max(0.0))
            .sum();
        if total_grow > 0.0 {
            for (size, it) in sizes.iter_mut().zip(items) {
                *size += free * it.constraints.flex_grow.max(0.0) / total_grow;
            }
        }
    } else if free < 0.0 {
        let weights: Vec<f32> = items
            .iter()
            .zip(&bases)
            .map(|(it, b)| it.constraints.flex_shrink.max(0.0) * b)
            .collect();
        let total: f32 = weights.iter().sum();
        if total > 0.0 {
            for (size, w) in sizes.iter_mut().zip(&weights) {
                *size = (*size + free * w / total).max(0.0);
            }
        }
    }
    for (size, it) in sizes.iter_mut().zip(items) {
        *size = clamp_main(&it.constraints, *size);
    }

    let used: f32 = sizes.iter().sum::<f32>() + margin_total + gaps;
    let remaining = (main_avail - used).max(0.0);
    let (mut cursor, extra) = match config.justify_content {
        JustifyContent::Start => (0.0, 0.0),
        JustifyContent::Center => (remaining / 2.0, 0.0),
        JustifyContent::End => (remaining, 0.0),
        JustifyContent::SpaceBetween if n > 1 => (0.0, remaining / (n - 1) as f32),
        JustifyContent::SpaceBetween => (0.0, 0.0),
        JustifyContent::SpaceAround => {
            let unit = remaining / n as f32;
            (unit / 2.0, unit)
        }
        JustifyContent::SpaceEvenly => {
            let unit = remaining / (n + 1) as f32;
            (unit, unit)
        }
    };

    let mut out = Vec::with_capacity(n);
    for (it, &main_size) in items.iter().zip(&sizes) {
        let c = &it.constraints;
        let (m_start, m_end) = main_margins(c);
        let (c_start, c_end) = cross_margins(c);

        let mut main_pos = main_origin + cursor + m_start;
        cursor += m_start + main_size + m_end + config.gap + extra;
        if dir.is_reverse() {
            main_pos = main_origin + main_avail - (main_pos - main_origin) - main_size;
        }

        let align = c.align_self.unwrap_or(config.align_items);
        let current_cross = if row {
            it.bounds.height
        } else {
            it.bounds.width
        };
        let cross_room = cross_avail - c_start - c_end;
        let cross_size = match align {
            AlignItems::Stretch => clamp_cross(c, cross_room),
            _ => clamp_cross(c, current_cross),
        };
        let cross_pos = match align {
            AlignItems::Start | AlignItems::Baseline | AlignItems::Stretch => {
                cross_origin + c_start
            }
            AlignItems::Center => cross_origin + c_start + (cross_room - cross_size) / 2.0,
            AlignItems::End => cross_origin + cross_avail - c_end - cross_size,
        };

        let b = if row {
            sized(main_pos, cross_pos, main_size, cross_size)
        } else {
            sized(cross_pos, main_pos, cross_size, main_size)
        };
        out.push((it.id, b));
    }
    out
}

fn layout_grid(
    config: &LayoutConfig,
    inner: Bounds,
    items: &[LayoutItem],
) -> Vec<(ComponentId, Bounds)> {
    let cols = config.grid_columns.max(1);
    let rows = config
        .grid_rows
        .unwrap_or_else(|| items.len().div_ceil(cols))
        .max(1);
    let cell_w = ((inner.width - config.gap * (cols - 1) as f32) / cols as f32).max(0.0);
    let cell_h = ((inner.height - config.gap * (rows - 1) as f32) / rows as f32).max(0.0);

    let capacity = rows * cols;
    if items.len() > capacity {
        log::debug!(
            "grid holds {} cells; {} member(s) left in place",
            capacity,
            items.len() - capacity
        );
    }
    items
        .iter()
        .take(capacity)
        .enumerate()
        .map(|(i, it)| {
            let (r, c) = (i / cols, i % cols);
            let m = it.constraints.margin;
            let x = inner.x + c as f32 * (cell_w + config.gap) + m.left;
            let y = inner.y + r as f32 * (cell_h + config.gap) + m.bottom;
            let w = it.constraints.clamp_width(cell_w - m.horizontal());
            let h = it.constraints.clamp_height(cell_h - m.vertical());
            (it.id, sized(x, y, w, h))
        })
        .collect()
}

fn layout_stack(
    config: &LayoutConfig,
    inner: Bounds,
    items: &[LayoutItem],
) -> Vec<(ComponentId, Bounds)> {
    let mut y = inner.y;
    items
        .iter()
        .map(|it| {
            let m = it.constraints.margin;
            let w = it.constraints.clamp_width(inner.width - m.horizontal());
            let h = it.constraints.clamp_height(it.bounds.height);
            let b = sized(inner.x + m.left, y + m.bottom, w, h);
            y += m.vertical() + h + config.gap;
            (it.id, b)
        })
        .collect()
}

fn layout_absolute(inner: Bounds, items: &[LayoutItem]) -> Vec<(ComponentId, Bounds)> {
    items
        .iter()
        .map(|it| {
            let c = &it.constraints;
            let m = c.margin;
            let b = it.bounds;

            let (x, w) = match (c.left, c.right) {
                (Some(l), Some(r)) => {
                    let w = c.clamp_width(inner.width - l - r - m.horizontal());
                    (inner.x + l + m.left, w)
                }
                (Some(l), None) => (inner.x + l + m.left, c.clamp_width(b.width)),
                (None, Some(r)) => {
                    let w = c.clamp_width(b.width);
                    (inner.right() - r - m.right - w, w)
                }
                (None, None) => (b.x, c.clamp_width(b.width)),
            };
            let (y, h) = match (c.top, c.bottom) {
                (Some(t), Some(bt)) => {
                    let h = c.clamp_height(inner.height - t - bt - m.vertical());
                    (inner.y + bt + m.bottom, h)
                }
                (None, Some(bt)) => (inner.y + bt + m.bottom, c.clamp_height(b.height)),
                (Some(t), None) => {
                    let h = c.clamp_height(b.height);
                    (inner.top() - t - m.top - h, h)
                }
                (None, None) => (b.y, c.clamp_height(b.height)),
            };
            (it.id, sized(x, y, w, h))
        })
        .collect()
}

#[derive(Clone, Debug, Default)]
struct Container {
    config: LayoutConfig,
    members: Vec<ComponentId>,
    constraints: HashMap<ComponentId, LayoutConstraints>,
    bounds: Option<Bounds>,
}

/// Called with `(old, new)` viewport sizes after a reflow.
pub type ResizeCallback = Rc<dyn Fn(Size, Size)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct LayoutManager {
    containers: BTreeMap<String, Container>,
    viewport: Size,
    subscribers: Vec<(SubscriptionId, ResizeCallback)>,
    next_subscription: u64,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `name`, or replaces its config while keeping its members.
    pub fn create_layout(&mut self, name: &str, config: LayoutConfig) {
        match self.containers.get_mut(name) {
            Some(existing) => {
                log::warn!("layout {:?} already exists; replacing its config", name);
                existing.config = config;
            }
            None => {
                self.containers.insert(
                    name.to_string(),
                    Container {
                        config,
                        ..Container::default()
                    },
                );
            }
        }
    }

    pub fn remove_layout(&mut self, name: &str) -> bool {
        self.containers.remove(name).is_some()
    }

    pub fn has_layout(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    pub fn config(&self, name: &str) -> Option<&LayoutConfig> {
        self.containers.get(name).map(|c| &c.config)
    }

    pub fn members(&self, name: &str) -> Option<&[ComponentId]> {
        self.containers.get(name).map(|c| c.members.as_slice())
    }

    pub fn container_bounds(&self, name: &str) -> Option<Bounds> {
        self.containers.get(name).and_then(|c| c.bounds)
    }

    fn container_mut(&mut self, name: &str) -> Result<&mut Container, LayoutError> {
        self.containers
            .get_mut(name)
            .ok_or_else(|| LayoutError::UnknownContainer(name.to_string()))
    }

    /// Appends `id` (or updates its constraints if already a member).
    pub fn add_component(
        &mut self,
        name: &str,
        id: ComponentId,
        constraints: LayoutConstraints,
    ) -> Result<(), LayoutError> {
        let container = self.container_mut(name)?;
        if !container.members.contains(&id) {
            container.members.push(id);
        }
        container.constraints.insert(id, constraints);
        Ok(())
    }

    pub fn remove_component(&mut self, name: &str, id: ComponentId) -> Result<bool, LayoutError> {
        let container = self.container_mut(name)?;
        container.constraints.remove(&id);
        let before = container.members.len();
        container.members.retain(|m| *m != id);
        Ok(container.members.len() != before)
    }

    /// Drops `id` from every container.
    pub fn forget_component(&mut self, id: ComponentId) {
        for container in self.containers.values_mut() {
            container.members.retain(|m| *m != id);
            container.constraints.remove(&id);
        }
    }

    pub fn set_constraints(
        &mut self,
        name: &str,
        id: ComponentId,
        constraints: LayoutConstraints,
    ) -> Result<(), LayoutError> {
        let container = self.container_mut(name)?;
        if !container.members.contains(&id) {
            log::warn!("{:?} is not in layout {:?}; adding it", id, name);
            container.members.push(id);
        }
        container.constraints.insert(id, constraints);
        Ok(())
    }

    pub fn constraints(&self, name: &str, id: ComponentId) -> Option<LayoutConstraints> {
        self.containers.get(name)?.constraints.get(&id).copied()
    }

    /// Lays `name` out inside `bounds` and remembers `bounds` for reflows.
    pub fn update_layout(
        &mut self,
        name: &str,
        bounds: Bounds,
        target: &mut dyn LayoutTarget,
    ) -> Result<(), LayoutError> {
        let container = self.container_mut(name)?;
        container.bounds = Some(bounds);
        run_container(name, container, bounds, target);
        Ok(())
    }

    /// Re-runs every container that has been laid out before.
    pub fn update_all_layouts(&mut self, target: &mut dyn LayoutTarget) {
        for (name, container) in self.containers.iter_mut() {
            if let Some(bounds) = container.bounds {
                run_container(name, container, bounds, target);
            }
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Reflows for a new viewport. Containers that filled at least 90% of
    /// the old viewport are stretched to the new one. Returns `false` when
    /// the size did not change.
    pub fn handle_viewport_change(
        &mut self,
        width: f32,
        height: f32,
        target: &mut dyn LayoutTarget,
    ) -> bool {
        let new = Size::new(width.max(0.0), height.max(0.0));
        let old = self.viewport;
        if new == old {
            return false;
        }
        log::debug!(
            "viewport {}x{} -> {}x{}",
            old.width,
            old.height,
            new.width,
            new.height
        );
        if old.width > 0.0 && old.height > 0.0 {
            for container in self.containers.values_mut() {
                if let Some(b) = container.bounds {
                    if b.width >= 0.9 * old.width && b.height >= 0.9 * old.height {
                        container.bounds = Some(Bounds::new(b.x, b.y, new.width, new.height));
                    }
                }
            }
        }
        self.viewport = new;
        self.update_all_layouts(target);

        let subscribers: Vec<ResizeCallback> =
            self.subscribers.iter().map(|(_, f)| f.clone()).collect();
        for f in subscribers {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(old, new))) {
                log::error!(
                    "resize subscriber panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
        true
    }

    pub fn subscribe_resize(&mut self, f: impl Fn(Size, Size) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe_resize(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }
}

fn run_container(name: &str, container: &Container, bounds: Bounds, target: &mut dyn LayoutTarget) {
    let items: Vec<LayoutItem> = container
        .members
        .iter()
        .filter_map(|&id| {
            let b = target.bounds_of(id)?;
            Some(LayoutItem {
                id,
                bounds: b,
                preferred: target.preferred_size_of(id).unwrap_or(b.size()),
                constraints: container.constraints.get(&id).copied().unwrap_or_default(),
            })
        })
        .collect();
    if items.len() != container.members.len() {
        log::debug!(
            "layout {:?}: skipping {} stale member(s)",
            name,
            container.members.len() - items.len()
        );
    }
    for (id, b) in compute_layout(&container.config, bounds, &items) {
        target.apply_bounds(id, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::cell::RefCell;

    fn ids(n: usize) -> Vec<ComponentId> {
        let mut map = SlotMap::<ComponentId, ()>::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn items(ids: &[ComponentId], w: f32, h: f32) -> Vec<LayoutItem> {
        ids.iter()
            .map(|&id| LayoutItem {
                id,
                bounds: Bounds::new(0.0, 0.0, w, h),
                preferred: Size::new(w, h),
                constraints: LayoutConstraints::default(),
            })
            .collect()
    }

    #[test]
    fn test_flex_row_grow_distribution() {
        let ids = ids(2);
        let mut its = items(&ids, 50.0, 20.0);
        its[0].constraints.flex_grow = 1.0;
        its[1].constraints.flex_grow = 3.0;
        let cfg = LayoutConfig {
            strategy: LayoutStrategy::FlexRow,
            ..LayoutConfig::default()
        };
        let out = compute_layout(&cfg, Bounds::new(0.0, 0.0, 300.0, 40.0), &its);
        assert_eq!(out[0].1, Bounds::new(0.0, 0.0, 100.0, 40.0));
        assert_eq!(out[1].1, Bounds::new(100.0, 0.0, 200.0, 40.0));
    }

    #[test]
    fn test_flex_shrink_weighted_by_basis() {
        let ids = ids(2);
        let mut its = items(&ids, 0.0, 10.0);
        its[0].constraints.flex_basis = Some(100.0);
        its[1].constraints.flex_basis = Some(300.0);
        let cfg = LayoutConfig {
            strategy: LayoutStrategy::FlexRow,
            align_items: AlignItems::Start,
            ..LayoutConfig::default()
        };
        let out = compute_layout(&cfg, Bounds::new(0.0, 0.0, 200.0, 10.0), &its);
        assert_eq!(out[0].1.width, 50.0);
        assert_eq!(out[1].1.width, 150.0);
        assert_eq!(out[1].1.x, 50.0);
    }

    #[test]
    fn test_justify_space_between_and_evenly() {
        let ids = ids(3);
        let its = items(&ids, 20.0, 10.0);
        let mut cfg = LayoutConfig {
            strategy: LayoutStrategy::FlexRow,
            justify_content: JustifyContent::SpaceBetween,
            ..LayoutConfig::default()
        };
        let container = Bounds::new(0.0, 0.0, 100.0, 10.0);
        let xs: Vec<f32> = compute_layout(&cfg, container, &its)
            .iter()
            .map(|(_, b)| b.x)
            .collect();
        assert_eq!(xs, vec![0.0, 40.0, 80.0]);

        cfg.justify_content = JustifyContent::SpaceEvenly;
        let xs: Vec<f32> = compute_layout(&cfg, container, &its)
            .iter()
            .map(|(_, b)| b.x)
            .collect();
        assert_eq!(xs, vec![10.0, 40.0, 70.0]);
    }

    #[test]
    fn test_column_flows_upward_and_reverse_mirrors() {
        let ids = ids(2);
        let its = items(&ids, 10.0, 30.0);
        let mut cfg = LayoutConfig {
            strategy: LayoutStrategy::FlexColumn,
            gap: 5.0,
            align_items: AlignItems::Start,
            ..LayoutConfig::default()
        };
        let container = Bounds::new(0.0, 0.0, 50.0, 100.0);
        let out = compute_layout(&cfg, container, &its);
        assert_eq!(out[0].1.y, 0.0);
        assert_eq!(out[1].1.y, 35.0);

        cfg.direction = FlexDirection::ColumnReverse;
        let out = compute_layout(&cfg, container, &its);
        assert_eq!(out[0].1.y, 70.0);
        assert_eq!(out[1].1.y, 35.0);
    }

    #[test]
    fn test_cross_alignment_and_margins() {
        let ids = ids(1);
        let mut its = items(&ids, 20.0, 10.0);
        its[0].constraints.margin = Insets {
            left: 4.0,
            right: 0.0,
            top: 2.0,
            bottom: 2.0,
        };
        let mut cfg = LayoutConfig {
            strategy: LayoutStrategy::FlexRow,
            align_items: AlignItems::Center,
            ..LayoutConfig::default()
        };
        let container = Bounds::new(0.0, 0.0, 100.0, 40.0);
        let b = compute_layout(&cfg, container, &its)[0].1;
        assert_eq!(b, Bounds::new(4.0, 15.0, 20.0, 10.0));

        cfg.align_items = AlignItems::Stretch;
        let b = compute_layout(&cfg, container, &its)[0].1;
        assert_eq!(b, Bounds::new(4.0, 2.0, 20.0, 36.0));

        its[0].constraints.align_self = Some(AlignItems::End);
        let b = compute_layout(&cfg, container, &its)[0].1;
        assert_eq!(b.y, 28.0);
    }

    #[test]
    fn test_min_max_applied_last() {
        let ids = ids(1);
        let mut its = items(&ids, 10.0, 10.0);
        its[0].constraints.flex_grow = 1.0;
        its[0].constraints.max_width = Some(60.0);
        its[0].constraints.min_height = Some(25.0);
        let cfg = LayoutConfig {
            strategy: LayoutStrategy::FlexRow,
            align_items: AlignItems::Start,
            ..LayoutConfig::default()
        };
        let b = compute_layout(&cfg, Bounds::new(0.0, 0.0, 200.0, 20.0), &its)[0].1;
        assert_eq!(b.width, 60.0);
        assert_eq!(b.height, 25.0);
    }

    #[test]
    fn test_grid_drops_overflow() {
        let ids = ids(5);
        let its = items(&ids, 1.0, 1.0);
        let cfg = LayoutConfig {
            grid_rows: Some(2),
            ..LayoutConfig::grid(2, 10.0)
        };
        let out = compute_layout(&cfg, Bounds::new(0.0, 0.0, 110.0, 50.0), &its);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].1, Bounds::new(0.0, 0.0, 50.0, 20.0));
        assert_eq!(out[1].1, Bounds::new(60.0, 0.0, 50.0, 20.0));
        assert_eq!(out[2].1, Bounds::new(0.0, 30.0, 50.0, 20.0));
    }

    #[test]
    fn test_stack_keeps_heights() {
        let ids = ids(2);
        let mut its = items(&ids, 5.0, 15.0);
        its[1].bounds.height = 25.0;
        let cfg = LayoutConfig {
            strategy: LayoutStrategy::Stack,
            gap: 4.0,
            padding: Insets::uniform(2.0),
            ..LayoutConfig::default()
        };
        let out = compute_layout(&cfg, Bounds::new(0.0, 0.0, 100.0, 100.0), &its);
        assert_eq!(out[0].1, Bounds::new(2.0, 2.0, 96.0, 15.0));
        assert_eq!(out[1].1, Bounds::new(2.0, 21.0, 96.0, 25.0));
    }

    #[test]
    fn test_absolute_anchors() {
        let ids = ids(4);
        let mut its = items(&ids, 20.0, 10.0);
        its[0].constraints.left = Some(5.0);
        its[0].constraints.right = Some(5.0);
        its[1].constraints.right = Some(0.0);
        its[2].constraints.top = Some(0.0);
        its[3].bounds = Bounds::new(7.0, 8.0, 20.0, 10.0);
        let cfg = LayoutConfig {
            strategy: LayoutStrategy::Absolute,
            ..LayoutConfig::default()
        };
        let out = compute_layout(&cfg, Bounds::new(0.0, 0.0, 100.0, 50.0), &its);
        assert_eq!(out[0].1, Bounds::new(5.0, 0.0, 90.0, 10.0));
        assert_eq!(out[1].1.x, 80.0);
        assert_eq!(out[2].1.y, 40.0);
        assert_eq!(out[3].1, Bounds::new(7.0, 8.0, 20.0, 10.0));
    }

    #[test]
    fn test_unknown_container_is_an_error() {
        let mut lm = LayoutManager::new();
        let id = ids(1)[0];
        assert_eq!(
            lm.add_component("nope", id, LayoutConstraints::default()),
            Err(LayoutError::UnknownContainer("nope".into()))
        );
    }

    #[test]
    fn test_viewport_change_stretches_and_notifies() {
        let id = ids(1)[0];
        let mut boxes: HashMap<ComponentId, Bounds> = HashMap::new();
        boxes.insert(id, Bounds::new(0.0, 0.0, 10.0, 10.0));

        let mut lm = LayoutManager::new();
        lm.create_layout("root", LayoutConfig::vertical_stack(0.0));
        lm.add_component("root", id, LayoutConstraints::default())
            .unwrap();
        assert!(lm.handle_viewport_change(800.0, 600.0, &mut boxes));
        lm.update_layout("root", Bounds::new(0.0, 0.0, 800.0, 600.0), &mut boxes)
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let sub = lm.subscribe_resize(move |old, new| s.borrow_mut().push((old, new)));
        lm.subscribe_resize(|_, _| panic!("bad subscriber"));

        assert!(lm.handle_viewport_change(1000.0, 700.0, &mut boxes));
        assert!(!lm.handle_viewport_change(1000.0, 700.0, &mut boxes));
        assert_eq!(
            lm.container_bounds("root"),
            Some(Bounds::new(0.0, 0.0, 1000.0, 700.0))
        );
        assert_eq!(boxes[&id].width, 1000.0);
        assert_eq!(seen.borrow().len(), 1);

        assert!(lm.unsubscribe_resize(sub));
        lm.handle_viewport_change(500.0, 500.0, &mut boxes);
        assert_eq!(seen.borrow().len(), 1);
    }
}
