// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeSet;

use serde::Serialize;

use super::classify::PathClassification;
use super::reduce::{MinimalCover, parent_dir};
use crate::app::types::{ScratchMode, Scheduler};

const RSYNC: &str = "rsync -aqru";
const SCRATCH_VAR: &str = "SCRATCH_DIR";

/// Everything the synthesizer needs besides the reduced paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationSettings {
    pub scratch: ScratchMode,
    pub scheduler: Scheduler,
    /// Directories synced on their own, in and out, whatever the cover says.
    pub include: BTreeSet<String>,
    /// Opaque rsync exclude patterns, in the order given.
    pub exclude: Vec<String>,
    pub clear_scratch: bool,
}

/// Shell lines produced for the scratch round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandSequence {
    pub move_to: Vec<String>,
    pub move_from: Vec<String>,
    pub clear: Vec<String>,
    /// Scratch-side directory creation. Lines never reference `SCRATCH_DIR`,
    /// so they can run anywhere in the script.
    pub mkdir: BTreeSet<String>,
}

/// One data movement between the submission filesystem and scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// Sync the contents of `source` into `destination`.
    Directory { source: String, destination: String },
    File { source: String, destination: String },
    /// The type of `source` is only known once the job has run, so the shell
    /// decides between a directory and a file sync.
    Deferred { source: String, destination: String },
}

impl Transfer {
    /// Render as shell lines. `suffix` is appended to directory syncs only.
    pub fn render(&self, suffix: &str) -> Vec<String> {
        match self {
            Transfer::Directory {
                source,
                destination,
            } => vec![format!("{RSYNC} {source}/ {destination}{suffix}")],
            Transfer::File {
                source,
                destination,
            } => vec![format!("{RSYNC} {source} {destination}")],
            Transfer::Deferred {
                source,
                destination,
            } => vec![
                format!(
                    "if [ -d {source} ]; then mkdir -p {destination}; {RSYNC} {source}/ {destination}; fi"
                ),
                format!(
                    "if [ -f {source} ]; then mkdir -p {}; {RSYNC} {source} {destination}; fi",
                    match parent_dir(destination) {
                        "" => ".",
                        parent => parent,
                    }
                ),
            ],
        }
    }
}

/// The `--exclude` tail appended to directory syncs.
///
/// The leading `/` terminates the destination directory that precedes it, so
/// rsync merges into it rather than nesting a copy.
pub fn exclude_suffix(exclude: &[String]) -> String {
    let mut seen = BTreeSet::new();
    let patterns: Vec<&str> = exclude
        .iter()
        .filter(|pattern| seen.insert(pattern.as_str()))
        .map(String::as_str)
        .collect();
    if patterns.is_empty() {
        return String::new();
    }
    format!("/ --exclude={{'{}'}}", patterns.join("','"))
}

/// Build the scratch lifecycle and transfer commands for a reduced path set.
pub fn synthesize(
    cover: &MinimalCover,
    classification: &PathClassification,
    settings: &RelocationSettings,
) -> CommandSequence {
    let scheduler = settings.scheduler;
    let Some(job_dir) = settings.scratch.job_dir(scheduler) else {
        return stay_in_submit_dir(scheduler);
    };

    let mut commands = CommandSequence::default();
    commands
        .move_to
        .push("# Define and create a scratch directory".to_string());
    commands.move_to.push(format!("{SCRATCH_VAR}=\"{job_dir}\""));
    commands.move_to.push(format!("mkdir -p ${{{SCRATCH_VAR}}}"));
    commands.move_to.push(format!("cd ${{{SCRATCH_VAR}}}"));
    commands
        .move_to
        .push(format!("echo Working directory is ${{{SCRATCH_VAR}}}"));

    let suffix = exclude_suffix(&settings.exclude);
    let stage_dir = |commands: &mut CommandSequence, dir: &String| {
        commands.mkdir.insert(format!("mkdir -p {job_dir}{}", rooted(dir)));
        let transfer = Transfer::Directory {
            source: dir.clone(),
            destination: scratch_path(dir),
        };
        commands.move_to.extend(transfer.render(&suffix));
    };

    // Stage-in order: directories, files, includes.
    for dir in &cover.directories {
        stage_dir(&mut commands, dir);
    }
    for file in &cover.files {
        commands
            .mkdir
            .insert(format!("mkdir -p {job_dir}{}", rooted(parent_dir(file))));
        let transfer = Transfer::File {
            source: file.clone(),
            destination: scratch_path(file),
        };
        commands.move_to.extend(transfer.render(""));
    }
    for include in &settings.include {
        stage_dir(&mut commands, include);
    }

    for dir in cover.directories.iter().chain(settings.include.iter()) {
        commands.move_from.push(format!("mkdir -p {dir}"));
        let transfer = Transfer::Directory {
            source: scratch_path(dir),
            destination: dir.clone(),
        };
        commands.move_from.extend(transfer.render(""));
    }
    for output in &classification.pending_outputs {
        let transfer = Transfer::Deferred {
            source: scratch_path(output),
            destination: output.clone(),
        };
        commands.move_from.extend(transfer.render(""));
    }

    if settings.clear_scratch {
        commands
            .clear
            .push("# Move away and clear out the scratch directory".to_string());
        commands
            .clear
            .push(format!("cd ${{{}}}", scheduler.submit_dir_var()));
        commands.clear.push(format!("rm -rf ${{{SCRATCH_VAR}}}"));
    }

    tracing::debug!(
        move_to = commands.move_to.len(),
        move_from = commands.move_from.len(),
        clear = commands.clear.len(),
        mkdir = commands.mkdir.len(),
        "synthesized relocation commands"
    );
    commands
}

fn stay_in_submit_dir(scheduler: Scheduler) -> CommandSequence {
    let work_dir = scheduler.submit_dir_var();
    CommandSequence {
        move_to: vec![
            "# Move to the working directory and say it".to_string(),
            format!("cd ${work_dir}"),
            format!("echo Working directory is ${work_dir}"),
        ],
        ..Default::default()
    }
}

/// `path` with a leading `/`, so it can be appended to a directory.
fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn scratch_path(path: &str) -> String {
    format!("${{{SCRATCH_VAR}}}{}", rooted(path))
}
