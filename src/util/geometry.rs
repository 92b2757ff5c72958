// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module maps points between the canvas (screen) pixel space and an
//! image's own pixel space, accounting for pan, zoom and rotation about the
//! image center.

/// A 2D point, either in screen or in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Vec2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Maps between screen space and the pixel space of one image.
///
/// Image to screen: translate to the image center, rotate about it (when
/// rotation is enabled), translate back, scale by zoom, then translate by pan.
/// Screen to image applies the inverse steps in reverse order.
///
/// The same primitive serves the frame-rotated space (boats) and the
/// frame-independent space (buoys); the latter is built with rotation
/// disabled so the stored angle is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformer {
    pub image_width: f64,
    pub image_height: f64,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub rotation_deg: f64,
    pub rotation_enabled: bool,
}

impl Transformer {
    pub fn new(
        image_width: f64,
        image_height: f64,
        zoom: f64,
        pan: Vec2,
        rotation_deg: f64,
        rotation_enabled: bool,
    ) -> Self {
        Self {
            image_width,
            image_height,
            zoom,
            pan_x: pan.x,
            pan_y: pan.y,
            rotation_deg,
            rotation_enabled,
        }
    }

    /// Geometric center of the image in image coordinates.
    pub fn image_center(&self) -> Vec2 {
        Vec2::new(self.image_width / 2.0, self.image_height / 2.0)
    }

    fn angle_rad(&self) -> f64 {
        if self.rotation_enabled {
            self.rotation_deg.to_radians()
        } else {
            0.0
        }
    }

    pub fn image_to_screen(&self, image: Vec2) -> Vec2 {
        let center = self.image_center();
        let (sin, cos) = self.angle_rad().sin_cos();
        let dx = image.x - center.x;
        let dy = image.y - center.y;
        let rx = dx * cos - dy * sin + center.x;
        let ry = dx * sin + dy * cos + center.y;
        Vec2::new(rx * self.zoom + self.pan_x, ry * self.zoom + self.pan_y)
    }

    pub fn screen_to_image(&self, screen: Vec2) -> Vec2 {
        let center = self.image_center();
        let (sin, cos) = self.angle_rad().sin_cos();
        let rx = (screen.x - self.pan_x) / self.zoom;
        let ry = (screen.y - self.pan_y) / self.zoom;
        let dx = rx - center.x;
        let dy = ry - center.y;
        Vec2::new(
            dx * cos + dy * sin + center.x,
            -dx * sin + dy * cos + center.y,
        )
    }
}
