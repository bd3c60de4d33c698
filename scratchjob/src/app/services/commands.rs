// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeSet;

const REDIRECTIONS: [&str; 5] = ["2>>", "2>", ">>", ">", "<"];
const UNEXPANDED: [char; 4] = ['$', '*', '?', '['];

/// Lines of an existing script, without its shebang.
pub fn script_commands(contents: &str) -> Vec<String> {
    let mut lines = contents.lines().peekable();
    if lines.peek().is_some_and(|line| line.starts_with("#!")) {
        lines.next();
    }
    lines.map(str::to_string).collect()
}

/// Absolute paths the commands mention, as candidates for staging.
///
/// Only literal paths are picked up; anything the shell would still expand
/// (variables, globs) is left alone.
pub fn harvest_paths(lines: &[String]) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    for line in lines {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for word in split_shell_words(line) {
            if let Some(path) = path_candidate(&word) {
                paths.insert(path.to_string());
            }
        }
    }
    tracing::debug!(paths = paths.len(), "harvested paths from commands");
    paths
}

fn path_candidate(word: &str) -> Option<&str> {
    let mut token = word;
    for op in REDIRECTIONS {
        if let Some(rest) = token.strip_prefix(op) {
            token = rest;
            break;
        }
    }
    if !token.starts_with('/') {
        if let Some((_, value)) = token.split_once('=') {
            token = value;
        }
    }
    let token = token.trim_end_matches([';', '&', '|']);
    if token.len() < 2 || !token.starts_with('/') || token.contains(UNEXPANDED) {
        return None;
    }
    Some(token)
}

/// Split a command line into words the way a POSIX shell would, honoring
/// single quotes, double quotes and backslash escapes.
pub fn split_shell_words(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;

    for ch in input.chars() {
        if escape {
            buf.push(ch);
            escape = false;
            continue;
        }
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                buf.push(ch);
            }
            continue;
        }
        if ch == '\\' {
            escape = true;
            continue;
        }
        if in_double {
            if ch == '"' {
                in_double = false;
            } else {
                buf.push(ch);
            }
            continue;
        }
        match ch {
            '\'' => in_single = true,
            '"' => in_double = true,
            ch if ch.is_whitespace() => {
                if !buf.is_empty() {
                    out.push(std::mem::take(&mut buf));
                }
            }
            _ => buf.push(ch),
        }
    }

    if escape {
        buf.push('\\');
    }
    if !buf.is_empty() {
        out.push(buf);
    }
    out
}
