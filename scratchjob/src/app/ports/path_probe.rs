// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::Serialize;

use crate::app::errors::AppResult;

/// What a path currently is on the submission host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    File,
    Directory,
    /// Neither a regular file nor a directory, including paths that do not exist.
    Missing,
}

/// Read-only existence checks used by the relocation planner.
///
/// Absence is not an error: implementations report it as [`PathKind::Missing`]
/// and reserve `Err` for probes that could not be answered (permissions, I/O).
pub trait PathProbePort: Send + Sync {
    fn probe(&self, path: &str) -> AppResult<PathKind>;
}
