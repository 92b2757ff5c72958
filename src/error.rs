// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types of the editing core.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or accept a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a project file: {0}")]
    Invalid(&'static str),
    #[error("malformed project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed project YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported project file extension: {0:?}")]
    UnsupportedExtension(Option<String>),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to turn files into frames.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no compatible images in {0}")]
    NoCompatibleImages(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to persist a project snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize project: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("save target write failed: {0}")]
    Target(#[source] std::io::Error),
    #[error("backup store write failed: {0}")]
    Backup(#[source] std::io::Error),
    #[error("export failed: {0}")]
    Export(String),
}
