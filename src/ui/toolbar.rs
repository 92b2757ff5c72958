// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! Tool buttons, the per-frame rotation slider and frame navigation.

use harborlabel::models::project::{MAX_ROTATION_DEG, MIN_ROTATION_DEG};
use harborlabel::{Editor, Tool};

/// Display the toolbar. Every change goes straight to the editor.
pub fn show(ui: &mut egui::Ui, editor: &mut Editor) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");
        ui.separator();

        for (key, tool) in ["", "", "1", "2", "3", "4"].into_iter().zip(Tool::ALL) {
            let text = if key.is_empty() {
                tool.name().to_string()
            } else {
                format!("{} {}", key, tool.name())
            };
            if ui.selectable_label(editor.tool() == tool, text).clicked() {
                editor.set_tool(tool);
            }
        }

        ui.separator();

        let tool_text = match editor.tool() {
            Tool::Select => "Click to select, drag to move, drag a handle to resize",
            Tool::Pan => "Drag to pan the view",
            Tool::BoatPoint | Tool::BuoyPoint => "Click to place a point",
            Tool::BoatBox | Tool::BuoyBox => "Drag to draw a box, click for a default box",
        };
        ui.label(egui::RichText::new(tool_text).italics().weak());
    });

    if !editor.has_frames() {
        return;
    }

    ui.horizontal(|ui| {
        let index = editor.viewport().current_index();
        let count = editor.store().frame_count();

        if ui.add_enabled(index > 0, egui::Button::new("◀")).clicked() {
            editor.prev_frame();
        }
        ui.label(format!("Frame {} / {}", index + 1, count));
        if ui.add_enabled(index + 1 < count, egui::Button::new("▶")).clicked() {
            editor.next_frame();
        }

        ui.separator();

        let mut rotation = editor.viewport().rotation(index);
        let slider = egui::Slider::new(&mut rotation, MIN_ROTATION_DEG..=MAX_ROTATION_DEG)
            .step_by(0.1)
            .suffix("°")
            .text("Rotation");
        if ui.add(slider).changed() {
            editor.set_rotation(rotation);
        }

        ui.separator();

        ui.label(format!("Zoom {:.0}%", editor.viewport().zoom() * 100.0));
        if ui.button("Reset view").clicked() {
            editor.reset_view();
        }
    });
}
