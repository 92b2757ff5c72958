// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation editing engine.
//!
//! The [`Editor`] owns the active tool, the transient selection and the
//! in-progress gesture. It turns pointer, wheel and key events into
//! whole-collection replacements on the [`AnnotationStore`] and changes on
//! the [`ViewportController`], then tells every subscriber about the new
//! project snapshot.

pub mod hit_test;
pub mod keymap;
pub mod store;
pub mod viewport;

use crate::models::annotation::{Annotation, AnnotationId, AnnotationKind, Handle, Label, MIN_BOX_SIDE};
use crate::models::project::{Frame, Project, SCHEMA_VERSION};
use crate::util::geometry::{Transformer, Vec2};
use chrono::{DateTime, Utc};
use hit_test::{Hit, HitTester};
use keymap::{Command, KeyEvent};
use store::{AnnotationStore, Space, Target};
use viewport::ViewportController;

/// Box gestures shorter than this many screen pixels count as clicks.
pub const CLICK_DRAG_THRESHOLD: f64 = 5.0;

/// Active editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Select,
    Pan,
    BoatPoint,
    BoatBox,
    BuoyPoint,
    BuoyBox,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Select,
        Tool::Pan,
        Tool::BoatPoint,
        Tool::BoatBox,
        Tool::BuoyPoint,
        Tool::BuoyBox,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Pan => "Pan",
            Tool::BoatPoint => "Boat point",
            Tool::BoatBox => "Boat box",
            Tool::BuoyPoint => "Buoy point",
            Tool::BuoyBox => "Buoy box",
        }
    }

    /// Shape, label and space produced by a drawing tool.
    pub fn draws(self) -> Option<(AnnotationKind, Label, Space)> {
        match self {
            Tool::Select | Tool::Pan => None,
            Tool::BoatPoint => Some((AnnotationKind::Point, Label::Boat, Space::Frame)),
            Tool::BoatBox => Some((AnnotationKind::BBox, Label::Boat, Space::Frame)),
            Tool::BuoyPoint => Some((AnnotationKind::Point, Label::Buoy, Space::Global)),
            Tool::BuoyBox => Some((AnnotationKind::BBox, Label::Buoy, Space::Global)),
        }
    }
}

/// The currently selected annotation. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub space: Space,
    pub id: AnnotationId,
    /// Position in the owning collection when last seen.
    pub index: Option<usize>,
}

/// Pointer input in canvas-local screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
enum Drag {
    Idle,
    Panning {
        last: Vec2,
    },
    Moving {
        space: Space,
        id: AnnotationId,
        last: Vec2,
    },
    Resizing {
        space: Space,
        id: AnnotationId,
        handle: Handle,
    },
    Drawing {
        start: Vec2,
        current: Vec2,
    },
}

type Observer = Box<dyn FnMut(&Project)>;

pub struct Editor {
    store: AnnotationStore,
    viewport: ViewportController,
    created_at: DateTime<Utc>,
    tool: Tool,
    /// Tool to restore when the held pan key is released.
    held_from: Option<Tool>,
    selection: Option<Selection>,
    hover: Option<Hit>,
    drag: Drag,
    observers: Vec<Observer>,
}

impl Editor {
    pub fn new(project: Project) -> Self {
        let (store, viewport, created_at) = split_project(project);
        Self {
            store,
            viewport,
            created_at,
            tool: Tool::Select,
            held_from: None,
            selection: None,
            hover: None,
            drag: Drag::Idle,
            observers: Vec::new(),
        }
    }

    /// Subscribe to project changes. Called after every mutation with the
    /// full snapshot.
    pub fn on_project_changed(&mut self, observer: impl FnMut(&Project) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Replace the whole project (import or project load).
    pub fn load_project(&mut self, project: Project) {
        let (store, viewport, created_at) = split_project(project);
        self.store = store;
        self.viewport = viewport;
        self.created_at = created_at;
        self.selection = None;
        self.hover = None;
        self.drag = Drag::Idle;
        log::info!("Loaded project with {} frames", self.store.frame_count());
        self.notify();
    }

    /// Assemble the persisted project from the store and viewport.
    pub fn snapshot(&self) -> Project {
        let frames = self
            .store
            .frame_sources()
            .iter()
            .enumerate()
            .map(|(index, source)| Frame {
                name: source.name.clone(),
                url: source.url.clone(),
                width: source.width,
                height: source.height,
                rotation_deg: self.viewport.rotation(index),
                annotations: self.store.get_frame_annotations(index).to_vec(),
            })
            .collect();

        Project {
            version: SCHEMA_VERSION,
            created_at: self.created_at,
            viewport: self.viewport.viewport(),
            current_index: self.viewport.current_index(),
            frames,
            global_buoys: self.store.get_global_annotations().to_vec(),
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn hover(&self) -> Option<&Hit> {
        self.hover.as_ref()
    }

    pub fn has_frames(&self) -> bool {
        self.store.frame_count() > 0
    }

    /// Screen-space corners of the box being drawn, for a live preview.
    pub fn drag_preview(&self) -> Option<(Vec2, Vec2)> {
        match (&self.drag, self.tool.draws()) {
            (Drag::Drawing { start, current }, Some((AnnotationKind::BBox, _, _))) => {
                Some((*start, *current))
            }
            _ => None,
        }
    }

    /// Transformer of `space` for the current frame; `None` without frames.
    pub fn transformer(&self, space: Space) -> Option<Transformer> {
        let index = self.viewport.current_index();
        let source = self.store.frame_source(index)?;
        Some(Transformer::new(
            source.width as f64,
            source.height as f64,
            self.viewport.zoom(),
            self.viewport.pan(),
            self.viewport.rotation(index),
            space == Space::Frame,
        ))
    }

    pub fn hit_tester(&self) -> Option<HitTester<'_>> {
        Some(HitTester::new(
            &self.store,
            self.viewport.current_index(),
            self.transformer(Space::Frame)?,
            self.transformer(Space::Global)?,
        ))
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.held_from = None;
        self.switch_tool(tool);
    }

    fn switch_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            log::debug!("Tool: {}", tool.name());
        }
        self.tool = tool;
        self.drag = Drag::Idle;
    }

    // ------------------------------------------------------------------
    // Pointer gestures
    // ------------------------------------------------------------------

    pub fn pointer(&mut self, event: PointerEvent) {
        if !self.has_frames() {
            return;
        }
        match event {
            PointerEvent::Down(at) => self.pointer_down(at),
            PointerEvent::Move(at) => self.pointer_move(at),
            PointerEvent::Up(at) => self.pointer_up(at),
            PointerEvent::Leave => {
                self.drag = Drag::Idle;
                self.hover = None;
            }
        }
    }

    fn pointer_down(&mut self, at: Vec2) {
        self.drag = match self.tool {
            Tool::Pan => Drag::Panning { last: at },
            Tool::Select => self.begin_select(at),
            Tool::BoatPoint | Tool::BoatBox | Tool::BuoyPoint | Tool::BuoyBox => Drag::Drawing {
                start: at,
                current: at,
            },
        };
    }

    fn begin_select(&mut self, at: Vec2) -> Drag {
        if let Some((space, id, handle)) = self.selected_handle_at(at) {
            return Drag::Resizing { space, id, handle };
        }

        let Some(tester) = self.hit_tester() else {
            return Drag::Idle;
        };
        let Some(hit) = tester.hit_test(at) else {
            self.selection = None;
            return Drag::Idle;
        };
        let handle = self
            .store
            .annotations(hit.space.target(self.viewport.current_index()))
            .get(hit.index)
            .and_then(|annotation| tester.handle_test(at, annotation, hit.space));

        self.selection = Some(Selection {
            space: hit.space,
            id: hit.id.clone(),
            index: Some(hit.index),
        });
        match handle {
            Some(handle) => Drag::Resizing {
                space: hit.space,
                id: hit.id,
                handle,
            },
            None => Drag::Moving {
                space: hit.space,
                id: hit.id,
                last: at,
            },
        }
    }

    /// A handle of the already selected box under `at`. Handles sit on and
    /// just outside the box edges, where the body hit test misses.
    fn selected_handle_at(&self, at: Vec2) -> Option<(Space, AnnotationId, Handle)> {
        let selection = self.selection.as_ref()?;
        let tester = self.hit_tester()?;
        let target = selection.space.target(self.viewport.current_index());
        let (_, annotation) = self.store.find(target, &selection.id)?;
        let handle = tester.handle_test(at, annotation, selection.space)?;
        Some((selection.space, selection.id.clone(), handle))
    }

    fn pointer_move(&mut self, at: Vec2) {
        match std::mem::replace(&mut self.drag, Drag::Idle) {
            Drag::Idle => {
                self.hover = match self.tool {
                    Tool::Select => self.hit_tester().and_then(|tester| tester.hit_test(at)),
                    _ => None,
                };
            }
            Drag::Panning { last } => {
                if self.viewport.pan_by(at.x - last.x, at.y - last.y) {
                    self.notify();
                }
                self.drag = Drag::Panning { last: at };
            }
            Drag::Moving { space, id, last } => {
                if self.move_selected(space, &id, last, at) {
                    self.drag = Drag::Moving { space, id, last: at };
                }
            }
            Drag::Resizing { space, id, handle } => {
                if self.resize_selected(space, &id, handle, at) {
                    self.drag = Drag::Resizing { space, id, handle };
                }
            }
            Drag::Drawing { start, .. } => {
                self.drag = Drag::Drawing { start, current: at };
            }
        }
    }

    /// Move by the image-space distance between two pointer positions.
    /// Returns false when the annotation no longer exists.
    fn move_selected(&mut self, space: Space, id: &AnnotationId, from: Vec2, to: Vec2) -> bool {
        if from == to {
            return true;
        }
        let Some(transformer) = self.transformer(space) else {
            return false;
        };
        let target = space.target(self.viewport.current_index());
        if self.store.find(target, id).is_none() {
            self.selection = None;
            return false;
        }

        let a = transformer.screen_to_image(from);
        let b = transformer.screen_to_image(to);
        let list = self.store.move_by_id(target, id, b.x - a.x, b.y - a.y);
        self.commit(target, list);
        true
    }

    /// Drag the edges touched by `handle` to the pointer, keeping the
    /// opposite edges fixed and each side at least `MIN_BOX_SIDE`.
    fn resize_selected(&mut self, space: Space, id: &AnnotationId, handle: Handle, at: Vec2) -> bool {
        let Some(transformer) = self.transformer(space) else {
            return false;
        };
        let target = space.target(self.viewport.current_index());
        let Some((_, annotation)) = self.store.find(target, id) else {
            self.selection = None;
            return false;
        };
        let Annotation::BBox { x, y, w, h, .. } = *annotation else {
            return true;
        };

        let p = transformer.screen_to_image(at);
        let (right, bottom) = (x + w, y + h);
        let (mut dx, mut dy, mut dw, mut dh) = (0.0, 0.0, 0.0, 0.0);
        if handle.moves_left() {
            dx = p.x.min(right - MIN_BOX_SIDE) - x;
            dw = -dx;
        }
        if handle.moves_right() {
            dw = p.x.max(x + MIN_BOX_SIDE) - right;
        }
        if handle.moves_top() {
            dy = p.y.min(bottom - MIN_BOX_SIDE) - y;
            dh = -dy;
        }
        if handle.moves_bottom() {
            dh = p.y.max(y + MIN_BOX_SIDE) - bottom;
        }

        let list = self
            .store
            .update_by_id(target, id, |a| a.translated(dx, dy).resized(dw, dh));
        self.commit(target, list);
        true
    }

    fn pointer_up(&mut self, at: Vec2) {
        if let Drag::Drawing { start, .. } = std::mem::replace(&mut self.drag, Drag::Idle) {
            self.finish_drawing(start, at);
        }
    }

    fn finish_drawing(&mut self, start: Vec2, end: Vec2) {
        let Some((kind, label, space)) = self.tool.draws() else {
            return;
        };
        let Some(transformer) = self.transformer(space) else {
            return;
        };

        let origin = transformer.screen_to_image(start);
        let annotation = match kind {
            AnnotationKind::Point => self.store.create_annotation(kind, label, origin.x, origin.y, None),
            AnnotationKind::BBox if end.sub(start).length() < CLICK_DRAG_THRESHOLD => {
                self.store.create_annotation(kind, label, origin.x, origin.y, None)
            }
            AnnotationKind::BBox => {
                let corner = transformer.screen_to_image(end);
                self.store.create_annotation(
                    kind,
                    label,
                    origin.x.min(corner.x),
                    origin.y.min(corner.y),
                    Some(((origin.x - corner.x).abs(), (origin.y - corner.y).abs())),
                )
            }
        };

        let target = space.target(self.viewport.current_index());
        log::debug!("Created {:?} {:?} {}", label, kind, annotation.id());
        let list = self.store.with_added(target, annotation);
        self.commit(target, list);
    }

    // ------------------------------------------------------------------
    // Viewport, navigation and keyboard
    // ------------------------------------------------------------------

    /// Center-preserving wheel zoom.
    pub fn wheel(&mut self, zoom_in: bool) {
        let Some(source) = self.store.frame_source(self.viewport.current_index()) else {
            return;
        };
        let (w, h) = (source.width as f64, source.height as f64);
        if self.viewport.wheel_zoom(zoom_in, w, h) {
            self.notify();
        }
    }

    pub fn zoom_by(&mut self, factor: f64) {
        if self.viewport.zoom_by(factor) {
            self.notify();
        }
    }

    pub fn reset_view(&mut self) {
        if self.viewport.reset() {
            self.notify();
        }
    }

    /// Set the current frame's rotation (slider input); clamped.
    pub fn set_rotation(&mut self, deg: f64) {
        if self.viewport.set_rotation(self.viewport.current_index(), deg) {
            self.notify();
        }
    }

    pub fn rotate_by(&mut self, delta: f64) {
        if self.viewport.rotate_by(self.viewport.current_index(), delta) {
            self.notify();
        }
    }

    /// Show frame `index`; out-of-range targets are ignored.
    pub fn go_to_frame(&mut self, index: usize) {
        if !self.viewport.go_to_frame(index) {
            return;
        }
        log::debug!("Frame {}/{}", index + 1, self.store.frame_count());
        self.drag = Drag::Idle;
        self.hover = None;
        if matches!(&self.selection, Some(s) if s.space == Space::Frame) {
            self.selection = None;
        }
        self.notify();
    }

    pub fn next_frame(&mut self) {
        self.go_to_frame(self.viewport.current_index() + 1);
    }

    pub fn prev_frame(&mut self) {
        if let Some(index) = self.viewport.current_index().checked_sub(1) {
            self.go_to_frame(index);
        }
    }

    /// Delete the selected annotation from its owning collection.
    pub fn delete_selection(&mut self) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        let target = selection.space.target(self.viewport.current_index());
        if self.store.find(target, &selection.id).is_none() {
            return;
        }
        let list = self.store.delete_by_id(target, &selection.id);
        self.commit(target, list);
        log::debug!("Deleted {}", selection.id);
    }

    /// Apply a key event through the dispatch table. Returns the command
    /// that was applied; `SaveNow` is left for the caller to act on.
    pub fn key(&mut self, event: KeyEvent) -> Option<Command> {
        if !self.has_frames() {
            return None;
        }
        let command = keymap::command_for(self.tool, event)?;
        match command {
            Command::Pan { dx, dy } => {
                let zoom = self.viewport.zoom();
                if self.viewport.pan_by(dx / zoom, dy / zoom) {
                    self.notify();
                }
            }
            Command::Zoom(factor) => self.zoom_by(factor),
            Command::Rotate(delta) => self.rotate_by(delta),
            Command::NextFrame => self.next_frame(),
            Command::PrevFrame => self.prev_frame(),
            Command::SelectTool(tool) => self.set_tool(tool),
            Command::DeleteSelection => self.delete_selection(),
            Command::HoldPan => {
                if self.tool != Tool::Pan {
                    self.held_from = Some(self.tool);
                    self.switch_tool(Tool::Pan);
                }
            }
            Command::ReleasePan => {
                if let Some(previous) = self.held_from.take() {
                    self.switch_tool(previous);
                }
            }
            Command::SaveNow => {}
        }
        Some(command)
    }

    // ------------------------------------------------------------------

    fn commit(&mut self, target: Target, list: Vec<Annotation>) {
        if self.store.replace(target, list) {
            self.revalidate_selection();
            self.notify();
        }
    }

    /// Drop a selection whose annotation vanished; refresh its index hint.
    fn revalidate_selection(&mut self) {
        let current = self.viewport.current_index();
        let Some(selection) = self.selection.as_ref() else {
            return;
        };
        let found = self
            .store
            .find(selection.space.target(current), &selection.id)
            .map(|(index, _)| index);
        match found {
            Some(index) => {
                if let Some(selection) = self.selection.as_mut() {
                    selection.index = Some(index);
                }
            }
            None => self.selection = None,
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer(&snapshot);
        }
    }
}

fn split_project(project: Project) -> (AnnotationStore, ViewportController, DateTime<Utc>) {
    let rotations = project.frames.iter().map(|f| f.rotation_deg).collect();
    let viewport = ViewportController::new(project.viewport, rotations, project.current_index);
    let frames = project
        .frames
        .into_iter()
        .map(|frame| {
            let source = frame.source();
            (source, frame.annotations)
        })
        .collect();
    let store = AnnotationStore::new(frames, project.global_buoys);
    (store, viewport, project.created_at)
}
