// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Scratch relocation planning.
//!
//! `classify` snapshots what each path is, `reduce` drops transfers that a
//! recursive directory sync already performs, and `synthesize` turns what is
//! left into shell lines for the job script.

pub mod classify;
pub mod reduce;
pub mod synthesize;

use std::collections::BTreeSet;

use serde::Serialize;

pub use classify::{PathClassification, classify};
pub use reduce::{ContainmentRule, MinimalCover, reduce};
pub use synthesize::{CommandSequence, RelocationSettings, Transfer, synthesize};

use crate::app::errors::AppResult;
use crate::app::ports::PathProbePort;

/// Everything the planner decided, in a form that can be printed as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationReport {
    pub classification: PathClassification,
    pub cover: MinimalCover,
    pub containment: ContainmentRule,
    pub commands: CommandSequence,
}

/// Run the three planning stages over `paths`.
///
/// Without a scratch location nothing moves, so the filesystem is not probed.
pub fn plan(
    paths: &BTreeSet<String>,
    settings: &RelocationSettings,
    rule: ContainmentRule,
    probe: &dyn PathProbePort,
) -> AppResult<RelocationReport> {
    if !settings.scratch.is_active() {
        tracing::debug!("no scratch location requested; skipping path probing");
        let classification = PathClassification::default();
        let cover = MinimalCover::default();
        let commands = synthesize(&cover, &classification, settings);
        return Ok(RelocationReport {
            classification,
            cover,
            containment: rule,
            commands,
        });
    }

    let classification = classify(paths, probe)?;
    let cover = reduce(&classification, &settings.include, rule);
    let commands = synthesize(&cover, &classification, settings);
    Ok(RelocationReport {
        classification,
        cover,
        containment: rule,
        commands,
    })
}
