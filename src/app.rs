// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The application owns the [`Editor`] and the [`PersistenceManager`]. The
//! editor reports every project change to the manager, which the update loop
//! polls so a burst of edits is written once. Frame images are decoded on a
//! background thread and uploaded as textures when ready.

use crate::ui::{canvas, toolbar};
use harborlabel::config::EditorConfig;
use harborlabel::editor::keymap::{Command, Key, KeyEvent};
use harborlabel::io::media::{self, LoadedImage, IMAGE_EXTENSIONS};
use harborlabel::io::persistence::{ExportSink, FileBackupStore, FileSaveTarget};
use harborlabel::io::serialization::{self, Format};
use harborlabel::{Editor, PersistenceManager, Project};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Instant;

/// Background decode of one frame image, keyed by its url.
struct PendingDecode {
    url: String,
    receiver: Receiver<Result<LoadedImage, String>>,
}

impl PendingDecode {
    /// The decode result once available. A decoder that exits without
    /// sending counts as a failed decode.
    fn poll(&self) -> Option<Result<LoadedImage, String>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err("decoder exited without a result".to_string())),
        }
    }
}

/// Writes an export wherever the user picks in a save dialog.
struct DialogExportSink {
    format: Format,
    saved_to: Option<PathBuf>,
}

impl ExportSink for DialogExportSink {
    fn deliver(&mut self, contents: &[u8], suggested_name: &str) -> std::io::Result<()> {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Project", &[self.format.extension()])
            .set_file_name(suggested_name)
            .save_file()
        else {
            return Ok(());
        };
        std::fs::write(&path, contents)?;
        self.saved_to = Some(path);
        Ok(())
    }
}

/// Main application state.
pub struct HarborApp {
    editor: Editor,

    /// Shared with the editor's change observer
    persistence: Rc<RefCell<PersistenceManager>>,

    canvas: canvas::CanvasState,

    /// Texture of the current frame and the url it was decoded from
    texture: Option<(String, egui::TextureHandle)>,

    pending_decode: Option<PendingDecode>,

    /// Urls that failed to decode; not retried
    failed_urls: HashSet<String>,

    /// Last user-facing message
    status: Option<String>,
}

impl HarborApp {
    /// Create the application, recovering the last backed-up project if any.
    pub fn new(config: &EditorConfig) -> Self {
        let backup = FileBackupStore::new(config.resolved_backup_dir());
        let manager = PersistenceManager::new(Box::new(backup))
            .with_delay(config.save_delay())
            .with_backup_key(config.backup_key.clone());

        let recovered = manager.recover();
        let status = recovered
            .as_ref()
            .map(|p| format!("Restored {} frames from backup", p.frames.len()));
        let mut editor = Editor::new(recovered.unwrap_or_else(Project::empty));

        let persistence = Rc::new(RefCell::new(manager));
        let observer = Rc::clone(&persistence);
        editor.on_project_changed(move |project| {
            observer
                .borrow_mut()
                .schedule_save(project.clone(), Instant::now());
        });

        Self {
            editor,
            persistence,
            canvas: canvas::CanvasState::default(),
            texture: None,
            pending_decode: None,
            failed_urls: HashSet::new(),
            status,
        }
    }

    fn replace_project(&mut self, project: Project) {
        self.texture = None;
        self.pending_decode = None;
        self.failed_urls.clear();
        self.editor.load_project(project);
    }

    fn open_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        match media::import_files(std::slice::from_ref(&path), &path) {
            Ok(sources) => self.replace_project(Project::from_sources(sources)),
            Err(e) => self.report_error("Could not open image", &e),
        }
    }

    fn open_folder(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        match media::import_folder(&dir) {
            Ok(sources) => {
                self.status = Some(format!("Imported {} frames", sources.len()));
                self.replace_project(Project::from_sources(sources));
            }
            Err(e) => self.report_error("Could not import folder", &e),
        }
    }

    /// Load a saved project. The current project is kept if loading fails.
    fn load_project(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Project", &["json", "yaml", "yml"])
            .pick_file()
        else {
            return;
        };
        match serialization::import_project(&path) {
            Ok(project) => {
                self.status = Some(format!("Loaded {}", path.display()));
                self.replace_project(project);
            }
            Err(e) => self.report_error("Could not load project", &e),
        }
    }

    fn choose_save_target(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("project.json")
            .save_file()
        else {
            return;
        };
        let snapshot = self.editor.snapshot();
        let mut persistence = self.persistence.borrow_mut();
        persistence.choose_save_target(Box::new(FileSaveTarget::new(path)));
        let report = persistence.save_now(&snapshot);
        self.status = Some(report.message());
    }

    fn release_save_target(&mut self) {
        if let Some(target) = self.persistence.borrow_mut().release_save_target() {
            self.status = Some(format!("No longer saving to {}", target.describe()));
        }
    }

    fn export(&mut self, format: Format) {
        let mut sink = DialogExportSink {
            format,
            saved_to: None,
        };
        let result = self
            .persistence
            .borrow()
            .export(&self.editor.snapshot(), format, &mut sink);
        match (result, sink.saved_to) {
            (Ok(_), Some(path)) => self.status = Some(format!("Exported to {}", path.display())),
            (Ok(_), None) => {}
            (Err(e), _) => self.report_error("Export failed", &e),
        }
    }

    fn save_now(&mut self) {
        let snapshot = self.editor.snapshot();
        let report = self.persistence.borrow_mut().save_now(&snapshot);
        self.status = Some(report.message());
    }

    fn report_error(&mut self, context: &str, error: &dyn std::fmt::Display) {
        log::error!("{}: {}", context, error);
        self.status = Some(format!("{}: {}", context, error));
    }

    /// Start decoding the current frame if its texture is missing.
    fn sync_texture(&mut self) {
        let index = self.editor.viewport().current_index();
        let Some(url) = self.editor.store().frame_source(index).map(|s| s.url.clone()) else {
            self.texture = None;
            return;
        };
        if self.texture.as_ref().is_some_and(|(u, _)| *u == url)
            || self.pending_decode.as_ref().is_some_and(|p| p.url == url)
            || self.failed_urls.contains(&url)
        {
            return;
        }

        let (sender, receiver) = channel();
        let path = PathBuf::from(&url);
        std::thread::spawn(move || {
            let result = media::load_image(&path).map_err(|e| e.to_string());
            let _ = sender.send(result);
        });
        self.pending_decode = Some(PendingDecode { url, receiver });
    }

    fn receive_texture(&mut self, ctx: &egui::Context) {
        let Some(pending) = &self.pending_decode else {
            return;
        };
        let Some(result) = pending.poll() else {
            ctx.request_repaint();
            return;
        };
        let url = pending.url.clone();
        self.pending_decode = None;

        match result {
            Ok(image) => {
                let size = [image.width as usize, image.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                let texture = ctx.load_texture(&url, color_image, egui::TextureOptions::LINEAR);
                self.texture = Some((url, texture));
            }
            Err(e) => {
                log::warn!("Failed to decode {}: {}", url, e);
                self.failed_urls.insert(url);
            }
        }
    }

    fn current_texture(&self) -> Option<&egui::TextureHandle> {
        let index = self.editor.viewport().current_index();
        let url = &self.editor.store().frame_source(index)?.url;
        self.texture
            .as_ref()
            .filter(|(u, _)| u == url)
            .map(|(_, texture)| texture)
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            let egui::Event::Key {
                key,
                pressed,
                modifiers,
                ..
            } = event
            else {
                continue;
            };
            let Some(key) = translate_key(key) else {
                continue;
            };
            let mut event = if pressed {
                KeyEvent::press(key)
            } else {
                KeyEvent::release(key)
            };
            if modifiers.shift {
                event = event.with_shift();
            }
            if modifiers.command {
                event = event.with_command();
            }
            if self.editor.key(event) == Some(Command::SaveNow) {
                self.save_now();
            }
        }
    }

    fn poll_saves(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let mut persistence = self.persistence.borrow_mut();
        if let Some(report) = persistence.poll(now) {
            if !report.is_success() {
                self.status = Some(report.message());
            }
        }
        if let Some(deadline) = persistence.deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    fn save_status(&self) -> String {
        let persistence = self.persistence.borrow();
        if persistence.is_pending() {
            return "Unsaved changes".to_string();
        }
        match persistence.last_report() {
            Some(report) => report.message(),
            None => match persistence.save_target() {
                Some(target) => format!("Saving to {}", target),
                None => "Backup only".to_string(),
            },
        }
    }
}

/// Map an egui key to the editor's key vocabulary.
fn translate_key(key: egui::Key) -> Option<Key> {
    use egui::Key as K;
    Some(match key {
        K::ArrowLeft => Key::ArrowLeft,
        K::ArrowRight => Key::ArrowRight,
        K::ArrowUp => Key::ArrowUp,
        K::ArrowDown => Key::ArrowDown,
        K::Escape => Key::Escape,
        K::Delete => Key::Delete,
        K::Backspace => Key::Backspace,
        K::Space => Key::Space,
        K::Plus => Key::Char('+'),
        K::Equals => Key::Char('='),
        K::Minus => Key::Char('-'),
        K::OpenBracket => Key::Char('['),
        K::CloseBracket => Key::Char(']'),
        K::Num1 => Key::Char('1'),
        K::Num2 => Key::Char('2'),
        K::Num3 => Key::Char('3'),
        K::Num4 => Key::Char('4'),
        K::A => Key::Char('a'),
        K::D => Key::Char('d'),
        K::N => Key::Char('n'),
        K::P => Key::Char('p'),
        K::S => Key::Char('s'),
        _ => return None,
    })
}

impl eframe::App for HarborApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_texture(ctx);
        self.sync_texture();
        self.handle_keys(ctx);
        self.poll_saves(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            if let Some(report) = self.persistence.borrow_mut().flush() {
                log::info!("{}", report.message());
            }
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image...").clicked() {
                        self.open_image();
                        ui.close_menu();
                    }
                    if ui.button("Open Folder...").clicked() {
                        self.open_folder();
                        ui.close_menu();
                    }
                    if ui.button("Load Project...").clicked() {
                        self.load_project();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save To...").clicked() {
                        self.choose_save_target();
                        ui.close_menu();
                    }
                    let has_target = self.persistence.borrow().save_target().is_some();
                    if ui
                        .add_enabled(has_target, egui::Button::new("Stop Saving To File"))
                        .clicked()
                    {
                        self.release_save_target();
                        ui.close_menu();
                    }
                    if ui.button("Save Now (Ctrl+S)").clicked() {
                        self.save_now();
                        ui.close_menu();
                    }
                    ui.menu_button("Export Project", |ui| {
                        if ui.button("Export as JSON...").clicked() {
                            self.export(Format::Json);
                            ui.close_menu();
                        }
                        if ui.button("Export as YAML...").clicked() {
                            self.export(Format::Yaml);
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let has_selection = self.editor.selection().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        self.editor.delete_selection();
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In (+)").clicked() {
                        self.editor.key(KeyEvent::press(Key::Char('+')));
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out (-)").clicked() {
                        self.editor.key(KeyEvent::press(Key::Char('-')));
                        ui.close_menu();
                    }
                    if ui.button("Reset View").clicked() {
                        self.editor.reset_view();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.editor);
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.save_status());
                if let Some(selection) = self.editor.selection() {
                    ui.separator();
                    ui.label(format!("Selected {:?} {}", selection.space, selection.id));
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(egui::RichText::new(status).weak());
                }
            });
        });

        // Main canvas (center)
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let texture = self.current_texture().cloned();
                canvas::show(ui, &mut self.editor, &mut self.canvas, texture.as_ref());
            });
    }
}
