// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod clock;
pub mod local_fs;
pub mod path_probe;

pub use clock::ClockPort;
pub use local_fs::LocalFilesystemPort;
pub use path_probe::{PathKind, PathProbePort};
