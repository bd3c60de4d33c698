// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod commands;
pub mod directives;
pub mod job_file;
pub mod paths;
pub mod preamble;
pub mod relocation;
pub mod script;
