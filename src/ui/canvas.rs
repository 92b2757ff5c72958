// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for frame display and annotation.
//!
//! This module paints the current frame (rotated through its transformer),
//! the boats and buoys on top of it, and forwards pointer and wheel input to
//! the editor in canvas-local coordinates.

use harborlabel::editor::hit_test::HANDLE_SIZE;
use harborlabel::editor::store::Space;
use harborlabel::models::annotation::{Annotation, Handle, Label};
use harborlabel::util::geometry::{Transformer, Vec2};
use harborlabel::{Editor, PointerEvent};

const BOAT_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 140, 0);
const BUOY_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 220, 40);
const SELECTED_COLOR: egui::Color32 = egui::Color32::WHITE;
const POINT_RADIUS: f32 = 5.0;

/// Pointer state carried between frames.
#[derive(Default)]
pub struct CanvasState {
    pointer_inside: bool,
}

/// Display the canvas and route pointer input to the editor.
pub fn show(
    ui: &mut egui::Ui,
    editor: &mut Editor,
    state: &mut CanvasState,
    texture: Option<&egui::TextureHandle>,
) {
    let (response, painter) =
        ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
    painter.rect_filled(response.rect, 0.0, egui::Color32::from_gray(40));
    let origin = response.rect.min;

    if !editor.has_frames() {
        show_welcome(&painter, response.rect);
        return;
    }

    handle_input(ui, &response, editor, state, origin);

    let (Some(rotated), Some(flat)) = (
        editor.transformer(Space::Frame),
        editor.transformer(Space::Global),
    ) else {
        return;
    };

    match texture {
        Some(texture) => paint_image(&painter, texture, &rotated, origin),
        None => {
            painter.text(
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                "Loading image...",
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(200),
            );
        }
    }

    let index = editor.viewport().current_index();
    let layers = [
        (Space::Frame, &rotated, editor.store().get_frame_annotations(index)),
        (Space::Global, &flat, editor.store().get_global_annotations()),
    ];
    for (space, transformer, annotations) in layers {
        for annotation in annotations {
            let selected = editor
                .selection()
                .is_some_and(|s| s.space == space && s.id == *annotation.id());
            let hovered = editor
                .hover()
                .is_some_and(|h| h.space == space && h.id == *annotation.id());
            paint_annotation(&painter, annotation, transformer, origin, selected, hovered);
        }
    }

    if let Some((start, end)) = editor.drag_preview() {
        let rect = egui::Rect::from_two_pos(to_screen(origin, start), to_screen(origin, end));
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, egui::Color32::LIGHT_BLUE));
    }

    if let Some(source) = editor.store().frame_source(index) {
        painter.text(
            origin + egui::vec2(8.0, 8.0),
            egui::Align2::LEFT_TOP,
            format!("{} ({}x{})", source.name, source.width, source.height),
            egui::FontId::proportional(13.0),
            egui::Color32::from_gray(220),
        );
    }
}

fn handle_input(
    ui: &egui::Ui,
    response: &egui::Response,
    editor: &mut Editor,
    state: &mut CanvasState,
    origin: egui::Pos2,
) {
    let Some(pos) = response.hover_pos() else {
        if std::mem::take(&mut state.pointer_inside) {
            editor.pointer(PointerEvent::Leave);
        }
        return;
    };
    state.pointer_inside = true;
    let at = to_local(origin, pos);

    let (pressed, released, moving, scroll) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.is_moving(),
            i.raw_scroll_delta.y,
        )
    });

    if pressed {
        editor.pointer(PointerEvent::Down(at));
    }
    if moving {
        editor.pointer(PointerEvent::Move(at));
    }
    if released {
        editor.pointer(PointerEvent::Up(at));
    }
    if scroll != 0.0 {
        editor.wheel(scroll > 0.0);
    }
}

fn to_local(origin: egui::Pos2, pos: egui::Pos2) -> Vec2 {
    Vec2::new((pos.x - origin.x) as f64, (pos.y - origin.y) as f64)
}

fn to_screen(origin: egui::Pos2, v: Vec2) -> egui::Pos2 {
    egui::pos2(origin.x + v.x as f32, origin.y + v.y as f32)
}

/// Paint the frame as a textured quad so rotation follows the transformer.
fn paint_image(
    painter: &egui::Painter,
    texture: &egui::TextureHandle,
    transformer: &Transformer,
    origin: egui::Pos2,
) {
    let (w, h) = (transformer.image_width, transformer.image_height);
    let corners = [
        (Vec2::new(0.0, 0.0), egui::pos2(0.0, 0.0)),
        (Vec2::new(w, 0.0), egui::pos2(1.0, 0.0)),
        (Vec2::new(w, h), egui::pos2(1.0, 1.0)),
        (Vec2::new(0.0, h), egui::pos2(0.0, 1.0)),
    ];

    let mut mesh = egui::Mesh::with_texture(texture.id());
    for (corner, uv) in corners {
        mesh.vertices.push(egui::epaint::Vertex {
            pos: to_screen(origin, transformer.image_to_screen(corner)),
            uv,
            color: egui::Color32::WHITE,
        });
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(egui::Shape::mesh(mesh));
}

fn paint_annotation(
    painter: &egui::Painter,
    annotation: &Annotation,
    transformer: &Transformer,
    origin: egui::Pos2,
    selected: bool,
    hovered: bool,
) {
    let base = match annotation.label() {
        Label::Boat => BOAT_COLOR,
        Label::Buoy => BUOY_COLOR,
    };
    let color = if selected { SELECTED_COLOR } else { base };
    let width = if hovered || selected { 3.0 } else { 2.0 };
    let project = |x: f64, y: f64| to_screen(origin, transformer.image_to_screen(Vec2::new(x, y)));

    match annotation {
        Annotation::Point { x, y, .. } => {
            let center = project(*x, *y);
            painter.circle_filled(center, POINT_RADIUS, color);
            painter.circle_stroke(center, POINT_RADIUS, egui::Stroke::new(1.0, egui::Color32::BLACK));
        }
        Annotation::BBox { x, y, w, h, .. } => {
            let outline = vec![
                project(*x, *y),
                project(x + w, *y),
                project(x + w, y + h),
                project(*x, y + h),
            ];
            painter.add(egui::Shape::closed_line(outline, egui::Stroke::new(width, color)));

            if selected {
                let size = egui::Vec2::splat(HANDLE_SIZE as f32);
                for handle in Handle::ALL {
                    let anchor = handle.anchor(*x, *y, *w, *h);
                    let center = project(anchor.x, anchor.y);
                    let rect = egui::Rect::from_center_size(center, size);
                    painter.rect_filled(rect, 0.0, SELECTED_COLOR);
                    painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
                }
            }
        }
    }
}

fn show_welcome(painter: &egui::Painter, rect: egui::Rect) {
    painter.text(
        rect.center() - egui::vec2(0.0, 20.0),
        egui::Align2::CENTER_CENTER,
        "harborlabel",
        egui::FontId::proportional(32.0),
        egui::Color32::from_gray(200),
    );
    painter.text(
        rect.center() + egui::vec2(0.0, 20.0),
        egui::Align2::CENTER_CENTER,
        "File → Open Image or Open Folder to begin labelling",
        egui::FontId::proportional(14.0),
        egui::Color32::from_gray(150),
    );
}
