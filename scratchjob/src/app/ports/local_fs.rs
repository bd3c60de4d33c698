// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

use crate::app::errors::AppResult;

/// Local filesystem boundary for the core.
/// Provides current dir resolution, file reads and the final script write.
pub trait LocalFilesystemPort: Send + Sync {
    fn current_dir(&self) -> AppResult<PathBuf>;
    fn read_to_string(&self, path: &Path) -> AppResult<String>;
    fn write_string(&self, path: &Path, contents: &str) -> AppResult<()>;
}
