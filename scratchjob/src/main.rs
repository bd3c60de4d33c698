// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use scratchjob::adapters::cli::{self, ParsedOpts};
use scratchjob::adapters::fs::LocalFilesystem;
use scratchjob::adapters::terminal::{
    confirm_action, print_with_green_check_stdout, print_with_red_cross_stderr, show_script,
};
use scratchjob::adapters::time::SystemClock;
use scratchjob::app::errors::{AppError, EXIT_CODE_OTHER};
use scratchjob::app::usecases::UseCases;
use scratchjob::{config, logging};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "scratchjob failed");
            let _ = print_with_red_cross_stderr(&format!("{err:#}"));
            let code = err
                .downcast_ref::<AppError>()
                .map(AppError::exit_code)
                .unwrap_or(EXIT_CODE_OTHER);
            ExitCode::from(code)
        }
    }
}

fn run() -> anyhow::Result<()> {
    let ParsedOpts { opts, overrides } = cli::parse_opts();
    if let Some(shell) = opts.completions {
        cli::print_completions(shell);
        return Ok(());
    }

    let config::LoadResult { config, report } =
        config::load_with_report(opts.config.clone(), overrides)?;
    logging::init(config.verbose);
    report.log();

    let fs = Arc::new(LocalFilesystem::new());
    let usecases = UseCases::new(fs.clone(), fs, Arc::new(SystemClock));
    let host_has_tmpdir = std::env::var_os("TMPDIR").is_some();
    let request = cli::build_request(&opts, &config, host_has_tmpdir)?;
    let generated = usecases.generate(&request)?;

    if opts.json {
        let json = serde_json::to_string_pretty(&generated.report)
            .context("failed to serialize relocation plan")?;
        println!("{json}");
        return Ok(());
    }
    if opts.print {
        print!("{}", generated.script);
        return Ok(());
    }

    if !opts.yes {
        show_script(&generated.script)?;
        let prompt = format!("Write {}?", generated.job_file.display());
        if !confirm_action(&prompt)? {
            return Err(AppError::canceled("job script not written").into());
        }
    }
    usecases.write(&generated)?;
    print_with_green_check_stdout(&format!("{}", generated.job_file.display()))?;
    Ok(())
}
