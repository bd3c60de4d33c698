// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::{ClockPort, LocalFilesystemPort, PathKind, PathProbePort};
use crate::app::services::directives::{LogPaths, directives};
use crate::app::services::relocation::{
    self, ContainmentRule, RelocationReport, RelocationSettings,
};
use crate::app::services::script::{ScriptParts, assemble};
use crate::app::services::{commands, job_file, paths, preamble};
use crate::app::types::{JobSpec, ScratchMode, Scheduler};

/// Everything needed to write one job script.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub job: JobSpec,
    /// Path to an existing script, or a command line.
    pub input: String,
    pub output: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Paths to stage in addition to those found in the commands.
    pub extra_paths: Vec<String>,
    pub scratch: ScratchMode,
    pub scheduler: Scheduler,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub clear_scratch: bool,
    pub containment: ContainmentRule,
    /// Whether the submitting environment defines `TMPDIR`.
    pub host_has_tmpdir: bool,
}

#[derive(Debug, Clone)]
pub struct GeneratedScript {
    pub job_file: PathBuf,
    pub script: String,
    pub report: RelocationReport,
}

#[derive(Clone)]
pub struct UseCases {
    pub(crate) probe: Arc<dyn PathProbePort>,
    pub(crate) local_fs: Arc<dyn LocalFilesystemPort>,
    pub(crate) clock: Arc<dyn ClockPort>,
}

impl UseCases {
    pub fn new(
        probe: Arc<dyn PathProbePort>,
        local_fs: Arc<dyn LocalFilesystemPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            probe,
            local_fs,
            clock,
        }
    }

    /// Build the script text and decide where it goes. Nothing is written.
    #[tracing::instrument(skip_all, fields(job = %request.job.name, scheduler = request.scheduler.as_str()))]
    pub fn generate(&self, request: &GenerateRequest) -> AppResult<GeneratedScript> {
        validate(request)?;
        let cwd = self.local_fs.current_dir()?;

        let job_commands = self.job_commands(&request.input, &cwd)?;
        let mut staged = commands::harvest_paths(&job_commands);
        staged.extend(
            request
                .extra_paths
                .iter()
                .map(|path| paths::absolutize_str(&cwd, path)),
        );
        let include: BTreeSet<String> = request
            .include
            .iter()
            .map(|path| paths::absolutize_str(&cwd, path))
            .collect();

        let settings = RelocationSettings {
            scratch: request.scratch.clone(),
            scheduler: request.scheduler,
            include,
            exclude: request.exclude.clone(),
            clear_scratch: request.clear_scratch,
        };
        let report = relocation::plan(
            &staged,
            &settings,
            request.containment,
            self.probe.as_ref(),
        )?;

        let output_dir = self.output_dir(&request.output_dir, &cwd)?;
        let output_dir = output_dir.to_string_lossy();
        let logs = LogPaths::new(&request.job.name, request.scheduler, &output_dir);
        let header = directives(
            &request.job,
            request.scheduler,
            &request.scratch,
            &output_dir,
        );
        let setup = preamble::preamble(
            &request.job,
            request.scheduler,
            &request.scratch,
            &logs,
            request.host_has_tmpdir,
        );
        let script = assemble(&ScriptParts {
            directives: &header,
            preamble: &setup,
            relocation: &report.commands,
            commands: &job_commands,
        });

        let job_file = job_file::job_file_path(
            request.output.as_deref(),
            &cwd,
            &request.job.name,
            request.scheduler,
            self.clock.now_utc(),
        )?;
        tracing::info!(
            job_file = %job_file.display(),
            staged = report.cover.directories.len() + report.cover.files.len(),
            pending_outputs = report.classification.pending_outputs.len(),
            "generated job script"
        );
        Ok(GeneratedScript {
            job_file,
            script,
            report,
        })
    }

    pub fn write(&self, generated: &GeneratedScript) -> AppResult<()> {
        self.local_fs
            .write_string(&generated.job_file, &generated.script)
            .map_err(|err| err.with_context("writing job script"))
    }

    fn job_commands(&self, input: &str, cwd: &Path) -> AppResult<Vec<String>> {
        let candidate = paths::absolutize(cwd, input);
        // A command is often not even a valid path name, so any inspection
        // error means the input is not a script.
        let kind = self
            .probe
            .probe(&candidate.to_string_lossy())
            .unwrap_or_else(|err| {
                tracing::debug!(error = %err, "input is not a readable path; using it as a command");
                PathKind::Missing
            });
        match kind {
            PathKind::File => {
                tracing::debug!(script = %candidate.display(), "reading commands from script");
                let contents = self.local_fs.read_to_string(&candidate)?;
                Ok(commands::script_commands(&contents))
            }
            PathKind::Directory | PathKind::Missing => Ok(vec![input.to_string()]),
        }
    }

    fn output_dir(&self, requested: &Path, cwd: &Path) -> AppResult<PathBuf> {
        let absolute = paths::absolutize(cwd, requested);
        let exists = self.probe.probe(&absolute.to_string_lossy())? == PathKind::Directory;
        Ok(job_file::output_dir(requested, exists, cwd))
    }
}

fn validate(request: &GenerateRequest) -> AppResult<()> {
    let job = &request.job;
    if job.name.trim().is_empty() {
        return Err(AppError::invalid_argument("job name must not be empty"));
    }
    if job.name.contains('/') || job.name.contains(char::is_whitespace) {
        return Err(AppError::invalid_argument(format!(
            "job name '{}' must not contain '/' or whitespace",
            job.name
        )));
    }
    if request.input.trim().is_empty() {
        return Err(AppError::invalid_argument("input must not be empty"));
    }
    for (what, value) in [
        ("node count", job.nnodes),
        ("cpu count", job.cpus),
        ("walltime", job.walltime_hours),
    ] {
        if value == 0 {
            return Err(AppError::invalid_argument(format!(
                "{what} must be at least 1"
            )));
        }
    }
    if let ScratchMode::Local { size_gb: 0, .. } = request.scratch {
        return Err(AppError::invalid_argument(
            "local scratch size must be at least 1 GB",
        ));
    }
    Ok(())
}
