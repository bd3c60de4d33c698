// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt::Write as _;

use crate::app::services::relocation::CommandSequence;

/// The pieces of a job script, before they are laid out.
#[derive(Debug, Clone, Copy)]
pub struct ScriptParts<'a> {
    pub directives: &'a [String],
    pub preamble: &'a [String],
    pub relocation: &'a CommandSequence,
    pub commands: &'a [String],
}

/// Lay the sections out in execution order, each closed by an END marker.
pub fn assemble(parts: &ScriptParts<'_>) -> String {
    let relocation = parts.relocation;
    let mkdir: Vec<String> = relocation.mkdir.iter().cloned().collect();
    let sections: [(&str, &[String]); 7] = [
        ("directives", parts.directives),
        ("preamble", parts.preamble),
        ("mkdir", mkdir.as_slice()),
        ("move_to", relocation.move_to.as_slice()),
        ("commands", parts.commands),
        ("move_from", relocation.move_from.as_slice()),
        ("clear", relocation.clear.as_slice()),
    ];

    let mut script = String::new();
    for (name, lines) in sections {
        for line in lines {
            let _ = writeln!(script, "{line}");
        }
        let _ = writeln!(script, "# ------ {name} END ------");
        script.push('\n');
    }
    script.push_str("echo \"Done!\"\n");
    script
}
