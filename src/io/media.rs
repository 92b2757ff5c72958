// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file loading.
//!
//! This module turns image files into frames at import time (name, path and
//! dimensions) and decodes pixels for display.

use crate::error::MediaError;
use crate::models::project::FrameSource;
use std::path::{Path, PathBuf};

/// File extensions offered by the pickers and accepted by folder import.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Decoded RGBA8 pixels of one image.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode an image file into RGBA8 pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage, MediaError> {
    let image = image::open(path).map_err(|source| MediaError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Read an image's dimensions and describe it as a frame.
pub fn probe_image(path: &Path) -> Result<FrameSource, MediaError> {
    let (width, height) = image::image_dimensions(path).map_err(|source| MediaError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(FrameSource {
        name,
        url: path.to_string_lossy().into_owned(),
        width,
        height,
    })
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Turn a batch of files into frames, in the given order.
///
/// Files that fail to decode are skipped with a warning. An empty result is
/// reported as [`MediaError::NoCompatibleImages`] against `origin`.
pub fn import_files(paths: &[PathBuf], origin: &Path) -> Result<Vec<FrameSource>, MediaError> {
    let frames: Vec<FrameSource> = paths
        .iter()
        .filter_map(|path| match probe_image(path) {
            Ok(frame) if frame.width > 0 && frame.height > 0 => Some(frame),
            Ok(_) => {
                log::warn!("Skipping empty image {}", path.display());
                None
            }
            Err(e) => {
                log::warn!("Skipping {}", e);
                None
            }
        })
        .collect();

    if frames.is_empty() {
        return Err(MediaError::NoCompatibleImages(origin.to_path_buf()));
    }
    log::info!("Imported {} of {} images", frames.len(), paths.len());
    Ok(frames)
}

/// Import every image in a folder, ordered by file name.
pub fn import_folder(dir: &Path) -> Result<Vec<FrameSource>, MediaError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    paths.sort();
    import_files(&paths, dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_probe_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor.png");
        write_png(&path, 6, 4);

        let frame = probe_image(&path).unwrap();
        assert_eq!(frame.name, "harbor.png");
        assert_eq!((frame.width, frame.height), (6, 4));

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.pixels.len(), 6 * 4 * 4);
    }

    #[test]
    fn test_folder_import_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 3, 3);
        write_png(&dir.path().join("a.png"), 2, 2);
        std::fs::write(dir.path().join("corrupt.png"), b"not an image").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let frames = import_folder(dir.path()).unwrap();
        let names: Vec<&str> = frames.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.png"]);
    }

    #[test]
    fn test_folder_without_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("corrupt.jpg"), b"nope").unwrap();
        assert!(matches!(
            import_folder(dir.path()),
            Err(MediaError::NoCompatibleImages(_))
        ));
    }

    #[test]
    fn test_extension_filter() {
        assert!(has_image_extension(Path::new("x.JPG")));
        assert!(!has_image_extension(Path::new("x.json")));
        assert!(!has_image_extension(Path::new("x")));
    }
}
