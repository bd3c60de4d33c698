// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Minimal cover reduction.
//!
//! Staging a directory with a recursive rsync also stages everything below it,
//! so a directory whose ancestor is staged anyway is redundant, and so is a
//! file sitting under a staged directory. The reducer removes both kinds of
//! redundancy, with one twist: directories the user explicitly includes are
//! synced on their own, which shadows every staged directory that would
//! otherwise swallow them.

use std::collections::BTreeSet;

use serde::Serialize;

use super::classify::PathClassification;

/// How "directory `a` already covers path `b`" is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentRule {
    /// `b` contains `a` as a plain substring. Coarse: `/data/run1` covers
    /// `/data/run10` and even `/x/data/run1`.
    #[default]
    Substring,
    /// `b` equals `a` or lies below it on a `/` boundary.
    PathSegment,
}

impl ContainmentRule {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            ContainmentRule::PathSegment
        } else {
            ContainmentRule::Substring
        }
    }

    /// Returns true when staging `ancestor` recursively is taken to stage `path`.
    pub fn covers(self, ancestor: &str, path: &str) -> bool {
        match self {
            ContainmentRule::Substring => path.contains(ancestor),
            ContainmentRule::PathSegment => is_path_ancestor(ancestor, path),
        }
    }
}

fn is_path_ancestor(ancestor: &str, path: &str) -> bool {
    let base = ancestor.trim_end_matches('/');
    if base.is_empty() {
        // `/` is an ancestor of every absolute path.
        return ancestor.starts_with('/') && path.starts_with('/');
    }
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Directories and files left to transfer after reduction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MinimalCover {
    pub directories: BTreeSet<String>,
    pub files: BTreeSet<String>,
}

/// Reduce a classification to its minimal cover.
pub fn reduce(
    classification: &PathClassification,
    include: &BTreeSet<String>,
    rule: ContainmentRule,
) -> MinimalCover {
    let directories = reduce_directories(&classification.directories, include, rule);
    let files = uncovered_files(&classification.files, &directories, rule);
    tracing::debug!(
        directories_in = classification.directories.len(),
        directories_out = directories.len(),
        files_in = classification.files.len(),
        files_out = files.len(),
        "reduced paths to minimal cover"
    );
    MinimalCover { directories, files }
}

/// Drop every directory covered by another one, and every directory that
/// covers an include path.
///
/// All pairs are checked in both directions: redundancy is a property of the
/// whole set, not of any evaluation order. When two spellings cover each
/// other (`/a` and `/a/` under [`ContainmentRule::PathSegment`]) the
/// lexicographically smaller one is kept.
pub fn reduce_directories(
    directories: &BTreeSet<String>,
    include: &BTreeSet<String>,
    rule: ContainmentRule,
) -> BTreeSet<String> {
    let sorted: Vec<&String> = directories.iter().collect();
    let mut redundant: BTreeSet<&String> = BTreeSet::new();

    for (i, first) in sorted.iter().enumerate() {
        for second in &sorted[i + 1..] {
            if rule.covers(first, second) {
                redundant.insert(*second);
            } else if rule.covers(second, first) {
                redundant.insert(*first);
            }
        }
    }

    for directory in &sorted {
        if include.iter().any(|path| rule.covers(directory, path)) {
            redundant.insert(*directory);
        }
    }

    sorted
        .into_iter()
        .filter(|directory| !redundant.contains(directory))
        .cloned()
        .collect()
}

/// Files whose parent directory is not covered by any of `directories`.
pub fn uncovered_files(
    files: &BTreeSet<String>,
    directories: &BTreeSet<String>,
    rule: ContainmentRule,
) -> BTreeSet<String> {
    files
        .iter()
        .filter(|file| {
            let parent = parent_dir(file);
            !directories
                .iter()
                .any(|directory| rule.covers(directory, parent))
        })
        .cloned()
        .collect()
}

/// Parent directory of `path`, as POSIX `dirname` computes it but ignoring
/// trailing slashes. `/1.txt` gives `/`; a bare name gives the empty string.
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => {
            let head = trimmed[..idx].trim_end_matches('/');
            if head.is_empty() { "/" } else { head }
        }
        None if path.starts_with('/') => "/",
        None => "",
    }
}
