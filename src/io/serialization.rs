// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project data serialization and deserialization.
//!
//! JSON is the canonical project and backup format; YAML is offered for
//! export and import alongside it. A loaded document is accepted only if it
//! has a non-null `version` and a `frames` list.

use crate::error::ProjectError;
use crate::models::project::Project;
use std::path::Path;

/// Project file format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, ProjectError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            _ => Err(ProjectError::UnsupportedExtension(extension)),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

pub fn to_json(project: &Project) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(project)
}

pub fn to_yaml(project: &Project) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(project)
}

/// Encode a project in the given format.
pub fn encode(project: &Project, format: Format) -> Result<String, ProjectError> {
    Ok(match format {
        Format::Json => to_json(project)?,
        Format::Yaml => to_yaml(project)?,
    })
}

/// Parse, validate and normalise a JSON project document.
pub fn from_json(text: &str) -> Result<Project, ProjectError> {
    accept(serde_json::from_str(text)?)
}

/// Parse, validate and normalise a YAML project document.
pub fn from_yaml(text: &str) -> Result<Project, ProjectError> {
    accept(serde_yaml::from_str(text)?)
}

pub fn decode(text: &str, format: Format) -> Result<Project, ProjectError> {
    match format {
        Format::Json => from_json(text),
        Format::Yaml => from_yaml(text),
    }
}

fn accept(value: serde_json::Value) -> Result<Project, ProjectError> {
    let Some(object) = value.as_object() else {
        return Err(ProjectError::Invalid("top level is not an object"));
    };
    if object.get("version").map_or(true, |v| v.is_null()) {
        return Err(ProjectError::Invalid("missing version"));
    }
    if !object.get("frames").is_some_and(|v| v.is_array()) {
        return Err(ProjectError::Invalid("missing frames list"));
    }
    let project: Project = serde_json::from_value(value)?;
    Ok(project.normalize())
}

/// Export project data to a file, in the format given by its extension.
pub fn export_project(project: &Project, path: &Path) -> Result<(), ProjectError> {
    let text = encode(project, Format::from_path(path)?)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Import project data from a file, in the format given by its extension.
pub fn import_project(path: &Path) -> Result<Project, ProjectError> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    decode(&text, format)
}
