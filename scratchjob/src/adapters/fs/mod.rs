// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::{LocalFilesystemPort, PathKind, PathProbePort};

/// The submitting host's filesystem.
#[derive(Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl PathProbePort for LocalFilesystem {
    #[tracing::instrument(name = "fs", level = "debug", skip(self), fields(op = "probe"))]
    fn probe(&self, path: &str) -> AppResult<PathKind> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(PathKind::File),
            Ok(meta) if meta.is_dir() => Ok(PathKind::Directory),
            Ok(_) => Ok(PathKind::Missing),
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                Ok(PathKind::Missing)
            }
            Err(err) => Err(AppError::probe_failure(format!(
                "failed to inspect {path}: {err}"
            ))),
        }
    }
}

impl LocalFilesystemPort for LocalFilesystem {
    #[tracing::instrument(name = "fs", level = "debug", skip(self), fields(op = "current_dir"))]
    fn current_dir(&self) -> AppResult<PathBuf> {
        std::env::current_dir().map_err(|err| {
            AppError::with_message(
                AppErrorKind::Internal,
                codes::LOCAL_ERROR,
                format!("failed to resolve current directory: {err}"),
            )
        })
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, path), fields(op = "read_to_string", path = %path.display()))]
    fn read_to_string(&self, path: &Path) -> AppResult<String> {
        std::fs::read_to_string(path).map_err(|err| {
            AppError::with_message(
                AppErrorKind::Internal,
                codes::LOCAL_ERROR,
                format!("failed to read {}: {err}", path.display()),
            )
        })
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, path, contents), fields(op = "write_string", path = %path.display(), bytes = contents.len()))]
    fn write_string(&self, path: &Path, contents: &str) -> AppResult<()> {
        std::fs::write(path, contents).map_err(|err| {
            AppError::local_error(format!("failed to write {}: {err}", path.display()))
        })
    }
}
