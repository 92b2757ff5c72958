// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! harborlabel - point and box labelling of boats and buoys
//!
//! A cross-platform desktop application for marking boats per frame and
//! buoys across a whole image sequence.

mod app;
mod ui;

use anyhow::Result;
use app::HarborApp;

fn main() -> Result<()> {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = harborlabel::config::load_config();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([800.0, 600.0])
            .with_title("harborlabel"),
        ..Default::default()
    };

    eframe::run_native(
        "harborlabel",
        options,
        Box::new(move |_cc| Ok(Box::new(HarborApp::new(&config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
