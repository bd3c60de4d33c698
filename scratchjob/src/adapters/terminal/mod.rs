// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::io::{IsTerminal, Write};

use anyhow::bail;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal;

const CHECK: char = '✓';
const CROSS: char = '✗';

/// Ask a yes/no question answered with a single key. Anything but `y` is a no.
pub fn confirm_action(prompt: &str) -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() || !std::io::stderr().is_terminal() {
        bail!("confirmation requires a TTY; pass --yes to skip the prompt");
    }
    let mut stderr = std::io::stderr();
    execute!(
        stderr,
        Print(prompt),
        SetForegroundColor(Color::DarkGrey),
        Print(" [y/N] "),
        ResetColor
    )?;

    let answer = {
        let _guard = RawModeGuard::enter()?;
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    break None;
                }
                KeyCode::Char('y') | KeyCode::Char('Y') => break Some(true),
                KeyCode::Char(_) | KeyCode::Enter | KeyCode::Esc => break Some(false),
                _ => {}
            }
        }
    };

    match answer {
        Some(yes) => {
            execute!(stderr, Print(if yes { "yes\r\n" } else { "no\r\n" }))?;
            Ok(yes)
        }
        None => {
            execute!(stderr, Print("\r\n"))?;
            bail!("prompt canceled");
        }
    }
}

/// Show the script about to be written, framed so it stands out from logs.
pub fn show_script(script: &str) -> anyhow::Result<()> {
    let mut stderr = std::io::stderr();
    let rule = "-".repeat(40);
    if stderr.is_terminal() {
        execute!(
            stderr,
            SetForegroundColor(Color::DarkGrey),
            Print(format!("{rule}\n")),
            ResetColor,
            Print(script),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("{rule}\n")),
            ResetColor
        )?;
        return Ok(());
    }
    write_all(&mut stderr, format!("{rule}\n{script}{rule}\n").as_bytes())
}

pub fn print_with_green_check_stdout(message: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    let colored = stdout.is_terminal();
    write_marked(&mut stdout, colored, CHECK, Color::Green, message)
}

pub fn print_with_red_cross_stderr(message: &str) -> anyhow::Result<()> {
    let mut stderr = std::io::stderr();
    let colored = stderr.is_terminal();
    write_marked(&mut stderr, colored, CROSS, Color::Red, message)
}

fn write_marked<W: Write>(
    w: &mut W,
    colored: bool,
    mark: char,
    color: Color,
    message: &str,
) -> anyhow::Result<()> {
    if !colored {
        return write_all(w, format!("{mark} {message}\n").as_bytes());
    }
    execute!(
        w,
        SetForegroundColor(color),
        Print(mark),
        ResetColor,
        Print(format!(" {message}\n"))
    )?;
    Ok(())
}

fn write_all<W: Write>(w: &mut W, buf: &[u8]) -> anyhow::Result<()> {
    w.write_all(buf)?;
    w.flush()?;
    Ok(())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
