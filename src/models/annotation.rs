// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the point and bounding-box annotations placed on
//! frames (boats) and on the frame-independent global layer (buoys).

use crate::util::geometry::Vec2;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Smallest allowed side length of a bounding box, in image units.
pub const MIN_BOX_SIDE: f64 = 5.0;

/// Side length of a box created by a click rather than a drag.
pub const DEFAULT_BOX_SIDE: f64 = 80.0;

/// Semantic label of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Boat,
    Buoy,
}

/// Identifier of an annotation, unique within its owning collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Older project files carry numeric identifiers.
impl<'de> Deserialize<'de> for AnnotationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Int(n) => Self(n.to_string()),
            Raw::Float(f) if f.fract() == 0.0 => Self((f as i64).to_string()),
            Raw::Float(f) => Self(f.to_string()),
        })
    }
}

/// Shape discriminant used when creating annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Point,
    BBox,
}

/// A point or axis-aligned box annotation in its owning space's image
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Annotation {
    #[serde(rename = "point")]
    Point {
        id: AnnotationId,
        label: Label,
        x: f64,
        y: f64,
    },
    #[serde(rename = "bbox")]
    BBox {
        id: AnnotationId,
        label: Label,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
}

impl Annotation {
    /// Create an annotation with a fresh identifier.
    ///
    /// For boxes, `size` defaults to [`DEFAULT_BOX_SIDE`] on both sides and is
    /// clamped to [`MIN_BOX_SIDE`]. `size` is ignored for points.
    pub fn create(
        kind: AnnotationKind,
        label: Label,
        x: f64,
        y: f64,
        size: Option<(f64, f64)>,
    ) -> Self {
        let id = AnnotationId::generate();
        match kind {
            AnnotationKind::Point => Annotation::Point { id, label, x, y },
            AnnotationKind::BBox => {
                let (w, h) = size.unwrap_or((DEFAULT_BOX_SIDE, DEFAULT_BOX_SIDE));
                Annotation::BBox {
                    id,
                    label,
                    x,
                    y,
                    w: w.max(MIN_BOX_SIDE),
                    h: h.max(MIN_BOX_SIDE),
                }
            }
        }
    }

    pub fn id(&self) -> &AnnotationId {
        match self {
            Annotation::Point { id, .. } | Annotation::BBox { id, .. } => id,
        }
    }

    pub fn label(&self) -> Label {
        match self {
            Annotation::Point { label, .. } | Annotation::BBox { label, .. } => *label,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Point { .. } => AnnotationKind::Point,
            Annotation::BBox { .. } => AnnotationKind::BBox,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            Annotation::Point { x, y, .. } | Annotation::BBox { x, y, .. } => Vec2::new(*x, *y),
        }
    }

    /// Return a copy shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut moved = self.clone();
        match &mut moved {
            Annotation::Point { x, y, .. } | Annotation::BBox { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
        }
        moved
    }

    /// Return a copy with width and height changed by `(dw, dh)`, clamped to
    /// [`MIN_BOX_SIDE`]. Points are returned unchanged.
    pub fn resized(&self, dw: f64, dh: f64) -> Self {
        match self {
            Annotation::Point { .. } => self.clone(),
            Annotation::BBox {
                id,
                label,
                x,
                y,
                w,
                h,
            } => Annotation::BBox {
                id: id.clone(),
                label: *label,
                x: *x,
                y: *y,
                w: (w + dw).max(MIN_BOX_SIDE),
                h: (h + dh).max(MIN_BOX_SIDE),
            },
        }
    }
}

/// One of the eight resize handles of a selected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::N,
        Handle::Ne,
        Handle::E,
        Handle::Se,
        Handle::S,
        Handle::Sw,
        Handle::W,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Handle::Nw => "nw",
            Handle::N => "n",
            Handle::Ne => "ne",
            Handle::E => "e",
            Handle::Se => "se",
            Handle::S => "s",
            Handle::Sw => "sw",
            Handle::W => "w",
        }
    }

    /// Position of this handle on the box `(x, y, w, h)`, in image units.
    pub fn anchor(self, x: f64, y: f64, w: f64, h: f64) -> Vec2 {
        let (fx, fy) = match self {
            Handle::Nw => (0.0, 0.0),
            Handle::N => (0.5, 0.0),
            Handle::Ne => (1.0, 0.0),
            Handle::E => (1.0, 0.5),
            Handle::Se => (1.0, 1.0),
            Handle::S => (0.5, 1.0),
            Handle::Sw => (0.0, 1.0),
            Handle::W => (0.0, 0.5),
        };
        Vec2::new(x + fx * w, y + fy * h)
    }

    /// Whether dragging this handle moves the left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, Handle::Nw | Handle::W | Handle::Sw)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Handle::Ne | Handle::E | Handle::Se)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Handle::Nw | Handle::N | Handle::Ne)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Handle::Sw | Handle::S | Handle::Se)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_box_defaults_and_clamps() {
        let default = Annotation::create(AnnotationKind::BBox, Label::Boat, 1.0, 2.0, None);
        match default {
            Annotation::BBox { w, h, .. } => assert_eq!((w, h), (80.0, 80.0)),
            other => panic!("expected a box, got {:?}", other),
        }

        let tiny = Annotation::create(AnnotationKind::BBox, Label::Buoy, 0.0, 0.0, Some((2.0, 2.0)));
        match tiny {
            Annotation::BBox { w, h, .. } => assert_eq!((w, h), (5.0, 5.0)),
            other => panic!("expected a box, got {:?}", other),
        }
    }

    #[test]
    fn test_fresh_ids_differ() {
        let a = Annotation::create(AnnotationKind::Point, Label::Boat, 0.0, 0.0, None);
        let b = Annotation::create(AnnotationKind::Point, Label::Boat, 0.0, 0.0, None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_resize_point_is_noop() {
        let p = Annotation::create(AnnotationKind::Point, Label::Buoy, 3.0, 4.0, None);
        assert_eq!(p.resized(10.0, 10.0), p);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let b = Annotation::create(AnnotationKind::BBox, Label::Boat, 0.0, 0.0, Some((20.0, 20.0)));
        match b.resized(-18.0, 5.0) {
            Annotation::BBox { w, h, .. } => assert_eq!((w, h), (5.0, 25.0)),
            other => panic!("expected a box, got {:?}", other),
        }
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"id":"a1","type":"bbox","label":"boat","x":1,"y":2,"w":30,"h":40}"#;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.id().as_str(), "a1");
        assert_eq!(ann.kind(), AnnotationKind::BBox);

        let value = serde_json::to_value(&ann).unwrap();
        assert_eq!(value["type"], "bbox");
        assert_eq!(value["label"], "boat");
        assert_eq!(value["w"], 30.0);
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let json = r#"{"id":1712345678901,"type":"point","label":"buoy","x":5,"y":6}"#;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.id().as_str(), "1712345678901");
        assert_eq!(ann.label(), Label::Buoy);
    }

    #[test]
    fn test_handle_anchors() {
        assert_eq!(Handle::Se.anchor(10.0, 20.0, 30.0, 40.0), Vec2::new(40.0, 60.0));
        assert_eq!(Handle::N.anchor(10.0, 20.0, 30.0, 40.0), Vec2::new(25.0, 20.0));
        assert!(Handle::Nw.moves_left() && Handle::Nw.moves_top());
        assert!(!Handle::E.moves_top() && !Handle::E.moves_bottom());
    }
}
