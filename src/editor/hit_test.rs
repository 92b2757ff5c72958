// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Finding the annotation and resize handle under a screen point.

use super::store::{AnnotationStore, Space, Target};
use crate::models::annotation::{Annotation, AnnotationId, Handle};
use crate::util::geometry::{Transformer, Vec2};

/// Points are hit within this distance, measured in image units.
pub const POINT_HIT_RADIUS: f64 = 10.0;

/// Drawn size of a resize handle.
pub const HANDLE_SIZE: f64 = 8.0;

/// A handle is grabbed within this multiple of `HANDLE_SIZE / zoom`.
pub const HANDLE_HIT_SCALE: f64 = 1.5;

/// Reference to the annotation found under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub space: Space,
    pub id: AnnotationId,
    pub index: usize,
}

pub struct HitTester<'a> {
    store: &'a AnnotationStore,
    frame: usize,
    rotated: Transformer,
    flat: Transformer,
}

impl<'a> HitTester<'a> {
    /// `rotated` maps the current frame's space, `flat` the global space.
    pub fn new(
        store: &'a AnnotationStore,
        frame: usize,
        rotated: Transformer,
        flat: Transformer,
    ) -> Self {
        Self {
            store,
            frame,
            rotated,
            flat,
        }
    }

    pub fn transformer(&self, space: Space) -> &Transformer {
        match space {
            Space::Frame => &self.rotated,
            Space::Global => &self.flat,
        }
    }

    /// Topmost annotation under `screen`. Frame boats are searched before
    /// global buoys; within a list the last inserted wins.
    pub fn hit_test(&self, screen: Vec2) -> Option<Hit> {
        [
            (Space::Frame, Target::Frame(self.frame)),
            (Space::Global, Target::Global),
        ]
        .into_iter()
        .find_map(|(space, target)| {
            let point = self.transformer(space).screen_to_image(screen);
            self.store
                .annotations(target)
                .iter()
                .enumerate()
                .rev()
                .find(|(_, annotation)| contains(annotation, point))
                .map(|(index, annotation)| Hit {
                    space,
                    id: annotation.id().clone(),
                    index,
                })
        })
    }

    /// Nearest resize handle of a box within grabbing distance of `screen`.
    /// Always `None` for points.
    pub fn handle_test(&self, screen: Vec2, annotation: &Annotation, space: Space) -> Option<Handle> {
        let Annotation::BBox { x, y, w, h, .. } = annotation else {
            return None;
        };
        let transformer = self.transformer(space);
        let threshold = HANDLE_HIT_SCALE * (HANDLE_SIZE / transformer.zoom);

        Handle::ALL
            .iter()
            .map(|&handle| {
                let anchor = transformer.image_to_screen(handle.anchor(*x, *y, *w, *h));
                (handle, anchor.distance(screen))
            })
            .filter(|(_, distance)| *distance < threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(handle, _)| handle)
    }
}

/// Whether an image-space point lies on the annotation. Boxes include their
/// top/left edges and exclude their bottom/right edges.
pub fn contains(annotation: &Annotation, point: Vec2) -> bool {
    match annotation {
        Annotation::Point { x, y, .. } => point.distance(Vec2::new(*x, *y)) < POINT_HIT_RADIUS,
        Annotation::BBox { x, y, w, h, .. } => {
            point.x >= *x && point.x < x + w && point.y >= *y && point.y < y + h
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Label;
    use crate::models::project::FrameSource;

    fn bbox(id: &str, x: f64, y: f64, w: f64, h: f64) -> Annotation {
        Annotation::BBox {
            id: id.into(),
            label: Label::Boat,
            x,
            y,
            w,
            h,
        }
    }

    fn point(id: &str, x: f64, y: f64) -> Annotation {
        Annotation::Point {
            id: id.into(),
            label: Label::Buoy,
            x,
            y,
        }
    }

    fn store(frame: Vec<Annotation>, global: Vec<Annotation>) -> AnnotationStore {
        let source = FrameSource {
            name: "f.png".to_string(),
            url: "f.png".to_string(),
            width: 400,
            height: 300,
        };
        AnnotationStore::new(vec![(source, frame)], global)
    }

    fn transformers(zoom: f64, rotation: f64) -> (Transformer, Transformer) {
        (
            Transformer::new(400.0, 300.0, zoom, Vec2::ZERO, rotation, true),
            Transformer::new(400.0, 300.0, zoom, Vec2::ZERO, rotation, false),
        )
    }

    #[test]
    fn test_topmost_box_wins() {
        let store = store(
            vec![bbox("under", 100.0, 100.0, 200.0, 200.0), bbox("over", 150.0, 150.0, 200.0, 200.0)],
            Vec::new(),
        );
        let (rotated, flat) = transformers(1.0, 0.0);
        let tester = HitTester::new(&store, 0, rotated, flat);

        let hit = tester.hit_test(Vec2::new(200.0, 200.0)).unwrap();
        assert_eq!(hit.id.as_str(), "over");
        assert_eq!(hit.index, 1);

        let hit = tester.hit_test(Vec2::new(120.0, 120.0)).unwrap();
        assert_eq!(hit.id.as_str(), "under");
    }

    #[test]
    fn test_box_edges_are_half_open() {
        let b = bbox("b", 10.0, 10.0, 20.0, 20.0);
        assert!(contains(&b, Vec2::new(10.0, 10.0)));
        assert!(!contains(&b, Vec2::new(30.0, 15.0)));
        assert!(!contains(&b, Vec2::new(15.0, 30.0)));
        assert!(contains(&b, Vec2::new(29.999, 29.999)));
    }

    #[test]
    fn test_point_radius_in_image_space() {
        let store = store(Vec::new(), vec![point("p", 100.0, 100.0)]);
        let (rotated, flat) = transformers(2.0, 0.0);
        let tester = HitTester::new(&store, 0, rotated, flat);

        // 9 image units away is 18 screen pixels at zoom 2.
        assert!(tester.hit_test(Vec2::new(218.0, 200.0)).is_some());
        assert!(tester.hit_test(Vec2::new(222.0, 200.0)).is_none());
    }

    #[test]
    fn test_frame_layer_before_global_layer() {
        let store = store(
            vec![bbox("boat", 0.0, 0.0, 50.0, 50.0)],
            vec![bbox("buoy", 0.0, 0.0, 50.0, 50.0)],
        );
        let (rotated, flat) = transformers(1.0, 0.0);
        let tester = HitTester::new(&store, 0, rotated, flat);

        let hit = tester.hit_test(Vec2::new(10.0, 10.0)).unwrap();
        assert_eq!(hit.space, Space::Frame);
        let hit = tester.hit_test(Vec2::new(60.0, 60.0));
        assert!(hit.is_none());
    }

    #[test]
    fn test_global_layer_ignores_rotation() {
        // Near a corner, a 10 degree rotation shifts the frame space a lot.
        let store = store(vec![bbox("boat", 0.0, 0.0, 20.0, 20.0)], vec![bbox("buoy", 0.0, 0.0, 20.0, 20.0)]);
        let (rotated, flat) = transformers(1.0, 10.0);
        let tester = HitTester::new(&store, 0, rotated, flat);

        let hit = tester.hit_test(Vec2::new(2.0, 2.0)).unwrap();
        assert_eq!(hit.space, Space::Global);
        assert_eq!(hit.id.as_str(), "buoy");
    }

    #[test]
    fn test_handle_detection() {
        let target = bbox("b", 100.0, 100.0, 50.0, 40.0);
        let store = store(vec![target.clone()], Vec::new());
        let (rotated, flat) = transformers(1.0, 0.0);
        let tester = HitTester::new(&store, 0, rotated, flat);

        // Threshold is 1.5 * 8 / 1 = 12 pixels.
        assert_eq!(tester.handle_test(Vec2::new(151.0, 141.0), &target, Space::Frame), Some(Handle::Se));
        assert_eq!(tester.handle_test(Vec2::new(125.0, 98.0), &target, Space::Frame), Some(Handle::N));
        assert_eq!(tester.handle_test(Vec2::new(125.0, 120.0), &target, Space::Frame), None);
        assert_eq!(tester.handle_test(Vec2::new(137.5, 100.0), &target, Space::Frame), None);

        let p = point("p", 100.0, 100.0);
        assert_eq!(tester.handle_test(Vec2::new(100.0, 100.0), &p, Space::Frame), None);
    }
}
