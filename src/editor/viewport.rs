// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Zoom, pan, per-frame rotation and the current frame index.

use crate::models::project::{clamp_rotation, Viewport, MAX_ZOOM, MIN_ZOOM};
use crate::util::geometry::Vec2;

/// Multiplicative zoom step of one wheel notch.
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;

/// Multiplicative zoom step of the `+`/`-` keys.
pub const KEY_ZOOM_FACTOR: f64 = 1.2;

/// Rotation change of one `[`/`]` key press, in degrees.
pub const ROTATION_STEP_DEG: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    zoom: f64,
    pan: Vec2,
    rotations: Vec<f64>,
    current_index: usize,
}

impl ViewportController {
    /// Build from persisted values; out-of-range inputs are clamped.
    pub fn new(viewport: Viewport, rotations: Vec<f64>, current_index: usize) -> Self {
        let current_index = current_index.min(rotations.len().saturating_sub(1));
        Self {
            zoom: clamp_zoom(viewport.zoom),
            pan: Vec2::new(viewport.pan_x, viewport.pan_y),
            rotations: rotations.into_iter().map(clamp_rotation).collect(),
            current_index,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            zoom: self.zoom,
            pan_x: self.pan.x,
            pan_y: self.pan.y,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn frame_count(&self) -> usize {
        self.rotations.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Rotation of one frame in degrees; 0 for an unknown frame.
    pub fn rotation(&self, frame: usize) -> f64 {
        self.rotations.get(frame).copied().unwrap_or(0.0)
    }

    /// Set zoom, clamped. Returns whether it changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let zoom = clamp_zoom(zoom);
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        changed
    }

    pub fn zoom_by(&mut self, factor: f64) -> bool {
        self.set_zoom(self.zoom * factor)
    }

    /// Wheel zoom that keeps the image center fixed on screen.
    ///
    /// The image center is also the rotation center, so its screen position
    /// is `center * zoom + pan` whatever the frame rotation.
    pub fn wheel_zoom(&mut self, zoom_in: bool, image_width: f64, image_height: f64) -> bool {
        let center = Vec2::new(image_width / 2.0, image_height / 2.0);
        let before = Vec2::new(
            center.x * self.zoom + self.pan.x,
            center.y * self.zoom + self.pan.y,
        );

        let factor = if zoom_in {
            WHEEL_ZOOM_FACTOR
        } else {
            1.0 / WHEEL_ZOOM_FACTOR
        };
        let new_zoom = clamp_zoom(self.zoom * factor);
        let landing = Vec2::new(center.x * new_zoom, center.y * new_zoom);

        let new_pan = before.sub(landing);
        let changed = new_zoom != self.zoom || new_pan != self.pan;
        self.zoom = new_zoom;
        self.pan = new_pan;
        changed
    }

    /// Add a screen-space delta to the pan offset.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.pan.x += dx;
        self.pan.y += dy;
        true
    }

    pub fn reset(&mut self) -> bool {
        let changed = self.zoom != 1.0 || self.pan != Vec2::ZERO;
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
        changed
    }

    /// Set a frame's rotation, clamped. Returns whether it changed.
    pub fn set_rotation(&mut self, frame: usize, deg: f64) -> bool {
        let Some(slot) = self.rotations.get_mut(frame) else {
            return false;
        };
        let deg = clamp_rotation(deg);
        let changed = *slot != deg;
        *slot = deg;
        changed
    }

    /// Step a frame's rotation, snapping to tenths so repeated steps don't drift.
    pub fn rotate_by(&mut self, frame: usize, delta: f64) -> bool {
        let target = ((self.rotation(frame) + delta) * 10.0).round() / 10.0;
        self.set_rotation(frame, target)
    }

    /// Jump to `index`; out-of-range targets are ignored.
    pub fn go_to_frame(&mut self, index: usize) -> bool {
        if index >= self.rotations.len() || index == self.current_index {
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn next_frame(&mut self) -> bool {
        self.go_to_frame(self.current_index + 1)
    }

    pub fn prev_frame(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.go_to_frame(index),
            None => false,
        }
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}
