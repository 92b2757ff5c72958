// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! This module defines the persisted project: the frame sequence with their
//! per-frame boats, the global buoy layer, and the saved viewport.

use super::annotation::{Annotation, MIN_BOX_SIDE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Current project file schema version.
pub const SCHEMA_VERSION: u32 = 1;

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 32.0;
pub const MIN_ROTATION_DEG: f64 = -10.0;
pub const MAX_ROTATION_DEG: f64 = 10.0;

/// Saved zoom and pan of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub pan_x: f64,
    #[serde(default)]
    pub pan_y: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Name, pixel reference and fixed dimensions of one image.
///
/// Produced by the image-source provider at import time and never resized.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSource {
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// One image in the sequence together with its boats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(deserialize_with = "lenient_dimension")]
    pub width: u32,
    #[serde(deserialize_with = "lenient_dimension")]
    pub height: u32,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Read a frame dimension from any number. Negative, fractional or
/// oversized values read as 0 so `Project::normalize` drops the frame.
fn lenient_dimension<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as u32)
    } else {
        Ok(0)
    }
}

impl Frame {
    pub fn from_source(source: FrameSource) -> Self {
        Self {
            name: source.name,
            url: source.url,
            width: source.width,
            height: source.height,
            rotation_deg: 0.0,
            annotations: Vec::new(),
        }
    }

    pub fn source(&self) -> FrameSource {
        FrameSource {
            name: self.name.clone(),
            url: self.url.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Complete project data for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub current_index: usize,
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub global_buoys: Vec<Annotation>,
}

impl Default for Project {
    fn default() -> Self {
        Self::empty()
    }
}

impl Project {
    /// An empty project with no frames.
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            created_at: Utc::now(),
            viewport: Viewport::default(),
            current_index: 0,
            frames: Vec::new(),
            global_buoys: Vec::new(),
        }
    }

    /// A fresh project over the given images.
    pub fn from_sources(sources: Vec<FrameSource>) -> Self {
        Self {
            frames: sources.into_iter().map(Frame::from_source).collect(),
            ..Self::empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Repair out-of-range values of a structurally valid project.
    ///
    /// Frames with a zero dimension are dropped, zoom and rotations are
    /// clamped, undersized boxes are raised to the minimum side and the
    /// current index is pulled back into range.
    pub fn normalize(mut self) -> Self {
        self.frames.retain(|frame| {
            let usable = frame.width > 0 && frame.height > 0;
            if !usable {
                log::warn!("Dropping frame '{}' with empty dimensions", frame.name);
            }
            usable
        });

        let zoom = self.viewport.zoom;
        self.viewport.zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            1.0
        };

        for frame in &mut self.frames {
            frame.rotation_deg = clamp_rotation(frame.rotation_deg);
            enforce_min_size(&mut frame.annotations);
        }
        enforce_min_size(&mut self.global_buoys);

        if self.current_index >= self.frames.len() {
            self.current_index = self.frames.len().saturating_sub(1);
        }
        self
    }
}

/// Clamp a rotation angle into the allowed range; non-finite input becomes 0.
pub fn clamp_rotation(deg: f64) -> f64 {
    if deg.is_finite() {
        deg.clamp(MIN_ROTATION_DEG, MAX_ROTATION_DEG)
    } else {
        0.0
    }
}

fn enforce_min_size(annotations: &mut [Annotation]) {
    for annotation in annotations {
        if let Annotation::BBox { w, h, .. } = annotation {
            *w = w.max(MIN_BOX_SIDE);
            *h = h.max(MIN_BOX_SIDE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{AnnotationKind, Label};

    fn source(name: &str) -> FrameSource {
        FrameSource {
            name: name.to_string(),
            url: format!("/images/{}", name),
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn test_from_sources() {
        let project = Project::from_sources(vec![source("a.jpg"), source("b.jpg")]);
        assert_eq!(project.frames.len(), 2);
        assert_eq!(project.current_index, 0);
        assert_eq!(project.version, SCHEMA_VERSION);
        assert!(project.global_buoys.is_empty());
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut project = Project::from_sources(vec![source("a.jpg")]);
        project.viewport.zoom = 100.0;
        project.current_index = 7;
        project.frames[0].rotation_deg = -45.0;
        project.frames[0].annotations.push(Annotation::BBox {
            id: "b".into(),
            label: Label::Boat,
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 50.0,
        });

        let project = project.normalize();
        assert_eq!(project.viewport.zoom, MAX_ZOOM);
        assert_eq!(project.current_index, 0);
        assert_eq!(project.frames[0].rotation_deg, MIN_ROTATION_DEG);
        match &project.frames[0].annotations[0] {
            Annotation::BBox { w, h, .. } => assert_eq!((*w, *h), (5.0, 50.0)),
            other => panic!("expected a box, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_drops_empty_frames() {
        let mut bad = source("broken.png");
        bad.width = 0;
        let project = Project::from_sources(vec![source("a.jpg"), bad]).normalize();
        assert_eq!(project.frames.len(), 1);
    }

    #[test]
    fn test_camel_case_fields() {
        let mut project = Project::from_sources(vec![source("a.jpg")]);
        project.global_buoys.push(Annotation::create(
            AnnotationKind::Point,
            Label::Buoy,
            1.0,
            2.0,
            None,
        ));
        let value = serde_json::to_value(&project).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("currentIndex").is_some());
        assert_eq!(value["globalBuoys"].as_array().map(Vec::len), Some(1));
        assert!(value["frames"][0].get("rotationDeg").is_some());
        assert!(value["viewport"].get("panX").is_some());
    }
}
