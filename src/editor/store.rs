// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canonical annotation storage.
//!
//! The store owns the frame sources, each frame's boats and the global buoy
//! list. Mutating helpers are pure: they return a new collection which the
//! caller hands back through `replace`, so a caller can diff or discard it.

use crate::models::annotation::{Annotation, AnnotationId, AnnotationKind, Label};
use crate::models::project::FrameSource;

/// Which collection an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Frame(usize),
    Global,
}

/// Coordinate space of an annotation: the current frame's rotated space
/// (boats) or the frame-independent space (buoys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    Frame,
    Global,
}

impl Space {
    /// The collection this space refers to while `frame` is current.
    pub fn target(self, frame: usize) -> Target {
        match self {
            Space::Frame => Target::Frame(frame),
            Space::Global => Target::Global,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    sources: Vec<FrameSource>,
    frame_annotations: Vec<Vec<Annotation>>,
    global: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new(frames: Vec<(FrameSource, Vec<Annotation>)>, global: Vec<Annotation>) -> Self {
        let (sources, frame_annotations): (Vec<_>, Vec<_>) = frames.into_iter().unzip();
        Self {
            sources,
            frame_annotations,
            global,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.sources.len()
    }

    pub fn frame_source(&self, index: usize) -> Option<&FrameSource> {
        self.sources.get(index)
    }

    pub fn frame_sources(&self) -> &[FrameSource] {
        &self.sources
    }

    /// Boats of one frame; empty for an out-of-range index.
    pub fn get_frame_annotations(&self, index: usize) -> &[Annotation] {
        self.frame_annotations
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_global_annotations(&self) -> &[Annotation] {
        &self.global
    }

    pub fn annotations(&self, target: Target) -> &[Annotation] {
        match target {
            Target::Frame(index) => self.get_frame_annotations(index),
            Target::Global => self.get_global_annotations(),
        }
    }

    /// Replace one frame's boats. Returns false for an out-of-range index.
    pub fn replace_frame_annotations(&mut self, index: usize, list: Vec<Annotation>) -> bool {
        match self.frame_annotations.get_mut(index) {
            Some(slot) => {
                *slot = list;
                true
            }
            None => false,
        }
    }

    pub fn replace_global_annotations(&mut self, list: Vec<Annotation>) {
        self.global = list;
    }

    pub fn replace(&mut self, target: Target, list: Vec<Annotation>) -> bool {
        match target {
            Target::Frame(index) => self.replace_frame_annotations(index, list),
            Target::Global => {
                self.replace_global_annotations(list);
                true
            }
        }
    }

    /// Build a new annotation with a fresh identifier; see [`Annotation::create`].
    pub fn create_annotation(
        &self,
        kind: AnnotationKind,
        label: Label,
        x: f64,
        y: f64,
        size: Option<(f64, f64)>,
    ) -> Annotation {
        Annotation::create(kind, label, x, y, size)
    }

    /// Position and value of the annotation with `id`, if it still exists.
    pub fn find(&self, target: Target, id: &AnnotationId) -> Option<(usize, &Annotation)> {
        self.annotations(target)
            .iter()
            .enumerate()
            .find(|(_, annotation)| annotation.id() == id)
    }

    /// The target collection with `annotation` appended.
    pub fn with_added(&self, target: Target, annotation: Annotation) -> Vec<Annotation> {
        let mut list = self.annotations(target).to_vec();
        list.push(annotation);
        list
    }

    pub fn delete_by_id(&self, target: Target, id: &AnnotationId) -> Vec<Annotation> {
        self.annotations(target)
            .iter()
            .filter(|annotation| annotation.id() != id)
            .cloned()
            .collect()
    }

    pub fn move_by_id(&self, target: Target, id: &AnnotationId, dx: f64, dy: f64) -> Vec<Annotation> {
        self.update_by_id(target, id, |annotation| annotation.translated(dx, dy))
    }

    /// Grow or shrink a box; points and unknown identifiers are left as is.
    pub fn resize_by_id(&self, target: Target, id: &AnnotationId, dw: f64, dh: f64) -> Vec<Annotation> {
        self.update_by_id(target, id, |annotation| annotation.resized(dw, dh))
    }

    /// The target collection with `f` applied to the annotation with `id`.
    pub fn update_by_id(
        &self,
        target: Target,
        id: &AnnotationId,
        f: impl Fn(&Annotation) -> Annotation,
    ) -> Vec<Annotation> {
        self.annotations(target)
            .iter()
            .map(|annotation| {
                if annotation.id() == id {
                    f(annotation)
                } else {
                    annotation.clone()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(id: &str, x: f64, y: f64, w: f64, h: f64) -> Annotation {
        Annotation::BBox {
            id: id.into(),
            label: Label::Boat,
            x,
            y,
            w,
            h,
        }
    }

    fn store() -> AnnotationStore {
        let source = FrameSource {
            name: "f0.png".to_string(),
            url: "f0.png".to_string(),
            width: 200,
            height: 100,
        };
        AnnotationStore::new(
            vec![(source, vec![boxed("a", 0.0, 0.0, 20.0, 20.0)])],
            vec![Annotation::Point {
                id: "a".into(),
                label: Label::Buoy,
                x: 5.0,
                y: 5.0,
            }],
        )
    }

    #[test]
    fn test_ids_are_scoped_per_collection() {
        let store = store();
        let id = AnnotationId::from("a");
        assert!(store.find(Target::Frame(0), &id).is_some());
        assert!(store.find(Target::Global, &id).is_some());

        let remaining = store.delete_by_id(Target::Global, &id);
        assert!(remaining.is_empty());
        assert_eq!(store.get_frame_annotations(0).len(), 1);
    }

    #[test]
    fn test_mutations_are_pure() {
        let store = store();
        let id = AnnotationId::from("a");
        let moved = store.move_by_id(Target::Frame(0), &id, 3.0, -2.0);
        assert_eq!(moved[0].position().x, 3.0);
        assert_eq!(store.get_frame_annotations(0)[0].position().x, 0.0);
    }

    #[test]
    fn test_resize_clamps() {
        let store = store();
        let resized = store.resize_by_id(Target::Frame(0), &AnnotationId::from("a"), -18.0, 0.0);
        assert_eq!(resized[0], boxed("a", 0.0, 0.0, 5.0, 20.0));
    }

    #[test]
    fn test_resize_point_is_noop() {
        let store = store();
        let resized = store.resize_by_id(Target::Global, &AnnotationId::from("a"), 10.0, 10.0);
        assert_eq!(resized, store.get_global_annotations());
    }

    #[test]
    fn test_stale_id_is_ignored() {
        let store = store();
        let ghost = AnnotationId::from("ghost");
        assert_eq!(
            store.move_by_id(Target::Frame(0), &ghost, 1.0, 1.0),
            store.get_frame_annotations(0)
        );
        assert_eq!(
            store.delete_by_id(Target::Frame(0), &ghost),
            store.get_frame_annotations(0)
        );
    }

    #[test]
    fn test_replace_out_of_range_frame() {
        let mut store = store();
        assert!(!store.replace_frame_annotations(3, Vec::new()));
        assert!(store.get_frame_annotations(3).is_empty());
    }
}
