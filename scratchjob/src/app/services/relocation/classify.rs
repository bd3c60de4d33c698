// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeSet;

use serde::Serialize;

use crate::app::errors::AppResult;
use crate::app::ports::{PathKind, PathProbePort};

/// Snapshot of what each requested path was when the script was generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathClassification {
    /// Existing regular files, staged in individually unless covered.
    pub files: BTreeSet<String>,
    /// Existing directories, candidates for the minimal cover.
    pub directories: BTreeSet<String>,
    /// Paths that do not exist yet; the job is expected to produce them.
    pub pending_outputs: BTreeSet<String>,
}

impl PathClassification {
    pub fn len(&self) -> usize {
        self.files.len() + self.directories.len() + self.pending_outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `paths` into files, directories and pending outputs.
///
/// A probe failure aborts the whole classification.
#[tracing::instrument(name = "classify", level = "debug", skip_all, fields(paths = paths.len()))]
pub fn classify(
    paths: &BTreeSet<String>,
    probe: &dyn PathProbePort,
) -> AppResult<PathClassification> {
    let mut classification = PathClassification::default();
    for path in paths {
        if !path.starts_with('/') {
            tracing::warn!(%path, "relative path will be staged relative to the scratch root");
        }
        let kind = probe
            .probe(path)
            .map_err(|err| err.with_context(format!("classifying {path}")))?;
        let bucket = match kind {
            PathKind::File => &mut classification.files,
            PathKind::Directory => &mut classification.directories,
            PathKind::Missing => &mut classification.pending_outputs,
        };
        bucket.insert(path.clone());
    }
    tracing::debug!(
        files = classification.files.len(),
        directories = classification.directories.len(),
        pending_outputs = classification.pending_outputs.len(),
        "classified paths"
    );
    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::errors::codes;
    use crate::app::services::relocation::fakes::FakeProbe;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classify_splits_files_directories_and_outputs() {
        let probe = FakeProbe::new()
            .with_file("/data/f1.txt")
            .with_file("/data/f2.txt")
            .with_dir("/data/d1")
            .with_dir("/data/d2");
        let paths = set(&[
            "/data/f1.txt",
            "/data/f2.txt",
            "/data/d1",
            "/data/d2",
            "/data/n1",
            "/data/n2.txt",
        ]);

        let classification = classify(&paths, &probe).unwrap();

        assert_eq!(classification.files, set(&["/data/f1.txt", "/data/f2.txt"]));
        assert_eq!(classification.directories, set(&["/data/d1", "/data/d2"]));
        assert_eq!(
            classification.pending_outputs,
            set(&["/data/n1", "/data/n2.txt"])
        );
        assert_eq!(classification.len(), 6);
    }

    #[test]
    fn classify_empty_input_is_empty() {
        let classification = classify(&BTreeSet::new(), &FakeProbe::new()).unwrap();
        assert!(classification.is_empty());
    }

    #[test]
    fn classify_propagates_probe_failures() {
        let probe = FakeProbe::new()
            .with_dir("/data/ok")
            .with_failure("/data/locked");
        let paths = set(&["/data/ok", "/data/locked"]);

        let err = classify(&paths, &probe).unwrap_err();

        assert_eq!(err.code(), codes::PROBE_FAILURE);
        assert_eq!(err.context(), Some("classifying /data/locked"));
    }
}
