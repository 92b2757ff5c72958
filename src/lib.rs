// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! harborlabel - point and box labelling of boats and buoys
//!
//! The editing core: coordinate transforms, the per-frame and global
//! annotation store, hit testing, the tool/gesture state machine, and
//! debounced project persistence. The egui shell lives in the binary.

pub mod config;
pub mod editor;
pub mod error;
pub mod io;
pub mod models;
pub mod util;

pub use editor::{Editor, PointerEvent, Selection, Tool};
pub use io::persistence::PersistenceManager;
pub use models::project::Project;
