// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Persisted data model: annotations and projects.

pub mod annotation;
pub mod project;
