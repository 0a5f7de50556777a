//! Canvas auto-expansion and viewport state.
//!
//! The scene's coordinate space grows when content is dropped near or past
//! its edges. Growth to the right/bottom only enlarges the canvas. Growth
//! to the left/top also shifts every root-level node by the same amount and
//! pans the viewport back, so nothing appears to move on screen.

use pd_core::geometry::{Bounds, format_px, style_length};
use pd_core::model::{Node, ProjectConfig};
use serde::{Deserialize, Serialize};

/// Distance from an edge that counts as "too close".
pub const EDGE_MARGIN: f64 = 50.0;
/// Extra room added beyond the content when growing.
pub const GROWTH_BUFFER: f64 = 200.0;

pub const DEFAULT_ZOOM: f64 = 0.6;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

// ─── Viewport ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Screen-side view of the canvas: zoom factor and pan offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub offset: Offset,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            offset: Offset::default(),
        }
    }
}

impl Viewport {
    /// Set zoom, clamped to `MIN_ZOOM..=MAX_ZOOM`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = if zoom.is_nan() {
            DEFAULT_ZOOM
        } else {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        };
    }

    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.offset = Offset { x, y };
    }
}

// ─── Expansion ────────────────────────────────────────────────────────────

/// Result of an expansion check: the new canvas size and the shift applied
/// to root-level content.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Expansion {
    pub width: f64,
    pub height: f64,
    pub shift_x: f64,
    pub shift_y: f64,
}

impl Expansion {
    pub fn has_shift(&self) -> bool {
        self.shift_x != 0.0 || self.shift_y != 0.0
    }
}

/// Compute how the canvas must grow to fit `rect`.
///
/// Returns `None` when the size is locked or nothing changes.
pub fn plan_expansion(config: &ProjectConfig, rect: &Bounds) -> Option<Expansion> {
    if config.lock_size {
        return None;
    }

    let mut plan = Expansion {
        width: config.width,
        height: config.height,
        ..Expansion::default()
    };

    if rect.right > config.width - EDGE_MARGIN {
        plan.width = plan.width.max(rect.right + GROWTH_BUFFER);
    }
    if rect.bottom > config.height - EDGE_MARGIN {
        plan.height = plan.height.max(rect.bottom + GROWTH_BUFFER);
    }
    if rect.left < EDGE_MARGIN {
        let delta = EDGE_MARGIN - rect.left + GROWTH_BUFFER;
        plan.width += delta;
        plan.shift_x = delta;
    }
    if rect.top < EDGE_MARGIN {
        let delta = EDGE_MARGIN - rect.top + GROWTH_BUFFER;
        plan.height += delta;
        plan.shift_y = delta;
    }

    let resized = plan.width != config.width || plan.height != config.height;
    (resized || plan.has_shift()).then_some(plan)
}

/// Apply a planned expansion to the scene: resize the config, move root-level
/// nodes by the shift and pan the viewport so the content stays put.
pub fn apply_expansion<'a>(
    plan: &Expansion,
    config: &mut ProjectConfig,
    nodes: impl IntoIterator<Item = &'a mut Node>,
    viewport: &mut Viewport,
) {
    config.width = plan.width;
    config.height = plan.height;
    if !plan.has_shift() {
        return;
    }

    for node in nodes.into_iter().filter(|n| n.is_root()) {
        if plan.shift_x != 0.0 {
            let left = style_length(&node.style, "left") + plan.shift_x;
            node.style.insert("left".into(), format_px(left).into());
        }
        if plan.shift_y != 0.0 {
            let top = style_length(&node.style, "top") + plan.shift_y;
            node.style.insert("top".into(), format_px(top).into());
        }
    }
    viewport.offset.x -= plan.shift_x * viewport.zoom;
    viewport.offset.y -= plan.shift_y * viewport.zoom;
}
