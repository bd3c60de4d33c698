// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::app::errors::{AppError, AppResult};
use crate::app::types::Scheduler;

/// Script path: `explicit` as given, otherwise
/// `<cwd>/<job>_<YYYY-MM-DD_HH-MM-SS>.<ext>`.
pub fn job_file_path(
    explicit: Option<&Path>,
    cwd: &Path,
    job: &str,
    scheduler: Scheduler,
    now: OffsetDateTime,
) -> AppResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let stamp = now
        .format(format_description!(
            "[year]-[month]-[day]_[hour]-[minute]-[second]"
        ))
        .map_err(|err| AppError::local_error(format!("failed to format timestamp: {err}")))?;
    Ok(cwd.join(format!("{job}_{stamp}.{}", scheduler.script_extension())))
}

/// Directory the scheduler logs go to. A requested directory that does not
/// exist falls back to `cwd`.
pub fn output_dir(requested: &Path, exists: bool, cwd: &Path) -> PathBuf {
    if !exists {
        tracing::warn!(
            requested = %requested.display(),
            fallback = %cwd.display(),
            "output directory does not exist; logs go to the current directory"
        );
        return cwd.to_path_buf();
    }
    crate::app::services::paths::absolutize(cwd, requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn default_name_has_timestamp_and_extension() {
        let now = datetime!(2026-03-07 09:05:01 UTC);
        let path =
            job_file_path(None, Path::new("/home/me"), "align", Scheduler::Slurm, now).unwrap();
        assert_eq!(path, Path::new("/home/me/align_2026-03-07_09-05-01.slm"));

        let path =
            job_file_path(None, Path::new("/home/me"), "align", Scheduler::Torque, now).unwrap();
        assert_eq!(path, Path::new("/home/me/align_2026-03-07_09-05-01.pbs"));
    }

    #[test]
    fn explicit_path_wins() {
        let now = datetime!(2026-03-07 09:05:01 UTC);
        let path = job_file_path(
            Some(Path::new("jobs/run.sh")),
            Path::new("/home/me"),
            "align",
            Scheduler::Slurm,
            now,
        )
        .unwrap();
        assert_eq!(path, Path::new("jobs/run.sh"));
    }

    #[test]
    fn output_dir_is_absolute_or_falls_back() {
        let cwd = Path::new("/home/me");
        assert_eq!(output_dir(Path::new("logs/"), true, cwd), Path::new("/home/me/logs"));
        assert_eq!(output_dir(Path::new("."), true, cwd), Path::new("/home/me"));
        assert_eq!(output_dir(Path::new("missing"), false, cwd), cwd);
    }
}
