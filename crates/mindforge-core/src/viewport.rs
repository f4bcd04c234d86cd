//! Viewport transform over a rendered diagram.
//!
//! Tracks the scale/offset applied to the rendered vector image inside its
//! container. Scale is clamped to `[0.3, 2.0]`; the offset is unbounded so a
//! user can pan past the content edges.

use serde::{Deserialize, Serialize};

/// Minimum zoom scale.
pub const MIN_SCALE: f32 = 0.3;
/// Maximum zoom scale.
pub const MAX_SCALE: f32 = 2.0;
/// Scale restored by the reset command, and the initial scale before a fit.
pub const DEFAULT_SCALE: f32 = 0.85;
/// Scale change per zoom step.
pub const ZOOM_STEP: f32 = 0.1;
/// Breathing-room factor applied when fitting content to the container.
pub const FIT_MARGIN: f32 = 0.85;

/// Pan offset in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ORIGIN: Offset = Offset { x: 0.0, y: 0.0 };
}

/// Discrete zoom commands from the viewer controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomCommand {
    In,
    Out,
    Reset,
    Fit,
}

/// The pan/zoom state of the diagram viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Current scale, always within `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f32,
    /// Accumulated pan offset; not clamped to the content bounds.
    pub offset: Offset,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            offset: Offset::ORIGIN,
        }
    }
}

/// Scale that fits content of `content_width` into `container_width` with the
/// standard margin, capped at 1 so small diagrams are not blown up.
pub fn fit_scale(container_width: f32, content_width: f32) -> f32 {
    if content_width <= 0.0 || container_width <= 0.0 {
        return 1.0;
    }
    (container_width / content_width * FIT_MARGIN).min(1.0)
}

impl ViewportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a freshly loaded diagram: fit scale, origin offset.
    pub fn fitted(container_width: f32, content_width: f32) -> Self {
        Self {
            scale: fit_scale(container_width, content_width),
            offset: Offset::ORIGIN,
        }
    }

    /// One zoom step in, clamped to [`MAX_SCALE`].
    pub fn zoom_in(&mut self) {
        self.scale = (self.scale + ZOOM_STEP).min(MAX_SCALE);
    }

    /// One zoom step out, clamped to [`MIN_SCALE`].
    pub fn zoom_out(&mut self) {
        self.scale = (self.scale - ZOOM_STEP).max(MIN_SCALE);
    }

    /// Restores the default scale and origin offset.
    pub fn reset(&mut self) {
        self.scale = DEFAULT_SCALE;
        self.offset = Offset::ORIGIN;
    }

    /// Refits to the container and recenters.
    pub fn fit(&mut self, container_width: f32, content_width: f32) {
        self.scale = fit_scale(container_width, content_width);
        self.offset = Offset::ORIGIN;
    }

    /// Accumulates a drag delta into the offset. No bounds clamping.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset.x += dx;
        self.offset.y += dy;
    }
}
