// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::services::directives::LogPaths;
use crate::app::types::{JobSpec, ScratchMode, Scheduler};

/// Environment setup lines that run before the job's commands.
///
/// `host_has_tmpdir` tells whether the submitting environment defines
/// `TMPDIR`; it is used as the last fallback for the temporary directory.
pub fn preamble(
    job: &JobSpec,
    scheduler: Scheduler,
    scratch: &ScratchMode,
    logs: &LogPaths,
    host_has_tmpdir: bool,
) -> Vec<String> {
    let mut out = vec![
        String::new(),
        "# general environment info / behaviour".to_string(),
        "uname -a".to_string(),
        "set -e".to_string(),
        "set -u".to_string(),
    ];

    if let Some(env) = &job.conda_env {
        out.push(String::new());
        out.push("# active conda environment".to_string());
        out.push(format!("echo \"Conda environment is {env}\""));
        out.push(format!("source activate {env}"));
    }

    if let Some(workdir) = &job.workdir {
        out.push(String::new());
        out.push("# change working directory".to_string());
        out.push(format!(
            "export {}='{workdir}'",
            scheduler.submit_dir_var()
        ));
    }

    let tmpdir = temporary_dir(job, scheduler, scratch, host_has_tmpdir);
    if let Some(dir) = &tmpdir {
        out.push(String::new());
        out.push("# create and export the temporary directory".to_string());
        out.push(format!("mkdir -p {dir}"));
        out.push(format!("export TMPDIR=\"{dir}\""));
    }

    out.push(String::new());
    out.push("# echo some info about the job".to_string());
    out.push("echo Running on host `hostname`".to_string());
    out.push("echo Time is `date`".to_string());
    out.push("echo Directory is `pwd`".to_string());
    if tmpdir.is_none() {
        // `set -u` is active, so an unset TMPDIR must not abort the job here
        out.push("echo Temporary directory is ${TMPDIR:-unset}".to_string());
    }
    let nodes = scheduler.node_list_var();
    out.push(format!("NPROCS=`wc -l < ${nodes}`"));
    out.push(format!("NNODES=`uniq ${nodes} | wc -l`"));
    out.push("echo Use ${NPROCS} procs on ${NNODES} nodes".to_string());
    out.push(format!("echo Job stdout is {}", logs.stdout_shell));
    out.push(format!("echo Job stderr is {}", logs.stderr_shell));
    out
}

/// Per-job temporary directory, if one can be chosen.
///
/// The base is the explicit `tmp` request, else a `tmpdir` folder inside the
/// job's scratch directory, else the host's `${TMPDIR}`.
pub fn temporary_dir(
    job: &JobSpec,
    scheduler: Scheduler,
    scratch: &ScratchMode,
    host_has_tmpdir: bool,
) -> Option<String> {
    let base = match (&job.tmp, scratch.job_dir(scheduler)) {
        (Some(tmp), _) => tmp.trim_end_matches('/').to_string(),
        (None, Some(job_dir)) => format!("{job_dir}/tmpdir"),
        (None, None) if host_has_tmpdir => "${TMPDIR}".to_string(),
        (None, None) => return None,
    };
    Some(format!(
        "{base}/{}_${{{}}}",
        job.name,
        scheduler.job_id_var()
    ))
}
