// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};
use clap_complete::Shell;

use crate::app::errors::{AppError, AppResult};
use crate::app::services::relocation::ContainmentRule;
use crate::app::types::{JobSpec, MemorySpec, ScratchMode, ScratchRequest, Scheduler};
use crate::app::usecases::GenerateRequest;
use crate::config::{Config, Overrides};

#[derive(Parser, Debug)]
#[command(
    name = "scratchjob",
    version,
    about = "Write Slurm or Torque job scripts that stage their data through scratch",
    long_about = None,
    after_help = "Configuration precedence: defaults < config file < command-line flags.\n\
Config path precedence: defaults < SCRATCHJOB_CONFIG_PATH < --config.\n\
Absolute paths in the commands are staged to scratch and back when a scratch location is chosen; \
paths that do not exist yet are fetched back after the job if it creates them."
)]
pub struct Opts {
    #[arg(
        short,
        long,
        value_name = "SCRIPT|COMMAND",
        required_unless_present = "completions",
        help = "Path to a script whose lines become the job commands, or a quoted command."
    )]
    pub input: Option<String>,
    #[arg(
        short,
        long,
        value_name = "NAME",
        required_unless_present = "completions",
        help = "Job name, used for the script name and the scheduler logs."
    )]
    pub job: Option<String>,
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Where to write the script. Defaults to <job>_<timestamp>.slm (or .pbs) in the current directory."
    )]
    pub output: Option<PathBuf>,
    #[arg(short, long, value_name = "ACCOUNT", help = "Account to charge. Overrides `account` from the config file.")]
    pub account: Option<String>,
    #[arg(short, long, value_name = "NAME", help = "Partition or queue. Overrides `partition` from the config file.")]
    pub partition: Option<String>,
    #[arg(short, long = "env", value_name = "ENV", help = "Conda environment to activate.")]
    pub env: Option<String>,
    #[arg(short, long, value_name = "DIR", default_value = ".", help = "Directory for the scheduler logs.")]
    pub dir: PathBuf,
    #[arg(short, long, value_name = "N", default_value_t = 1, help = "Number of nodes.")]
    pub nnodes: u32,
    #[arg(short, long, value_name = "N", default_value_t = 1, help = "Number of CPUs (per node when several nodes are requested).")]
    pub cpus: u32,
    #[arg(short, long, value_name = "HOURS", default_value_t = 1, help = "Walltime in hours.")]
    pub time: u32,
    #[arg(short = 'T', long, value_name = "DIR", help = "Base for the job's temporary directory.")]
    pub tmp: Option<String>,
    #[arg(
        short = 'M',
        long,
        value_name = "MEM",
        num_args = 1..=2,
        help = "Memory, e.g. `500 MB` or `4GB`. Defaults to 500 MB."
    )]
    pub mem: Option<Vec<String>>,
    #[arg(short = 'm', long, value_name = "MEM", num_args = 1..=2, help = "Memory per CPU; replaces --mem.")]
    pub mem_per_cpu: Option<Vec<String>>,
    #[arg(short = 'N', long = "nodes", value_name = "NODE", help = "Run on this node; repeat for several.")]
    pub nodes: Vec<String>,
    #[arg(short, long, value_name = "DIR", help = "Working directory exported to the job.")]
    pub workdir: Option<String>,
    #[arg(short, long, value_name = "GB", help = "Use node-local scratch of this size.")]
    pub localscratch: Option<u32>,
    #[arg(short = 'x', long, value_name = "PATTERN", help = "rsync exclude pattern for staged directories; repeatable.")]
    pub exclude: Vec<String>,
    #[arg(long, value_name = "DIR", help = "Directory synced on its own to and from scratch; repeatable.")]
    pub include: Vec<String>,
    #[arg(long = "path", value_name = "PATH", help = "Extra path to stage; repeatable.")]
    pub paths: Vec<String>,
    #[arg(long, help = "Compute in the cluster scratch location.")]
    pub scratch: bool,
    #[arg(long, help = "Compute in the per-user scratch location.")]
    pub userscratch: bool,
    #[arg(
        long,
        overrides_with = "no_clear_scratch",
        help = "Remove the scratch directory when the job ends. Overrides `clear_scratch` from the config file."
    )]
    pub clear_scratch: bool,
    #[arg(long, overrides_with = "clear_scratch", help = "Keep the scratch directory when the job ends.")]
    pub no_clear_scratch: bool,
    #[arg(long, help = "Email on job end or failure, to the `email` address from the config file.")]
    pub email: bool,
    #[arg(long, help = "Request one GPU.")]
    pub gpu: bool,
    #[arg(
        long,
        overrides_with = "no_torque",
        help = "Write a Torque/PBS script instead of Slurm. Overrides `torque` from the config file."
    )]
    pub torque: bool,
    #[arg(long, overrides_with = "torque", help = "Write a Slurm script even if the config file selects Torque.")]
    pub no_torque: bool,
    #[arg(
        long,
        overrides_with = "no_strict_ancestry",
        help = "Only treat a directory as covering paths below it on a `/` boundary, instead of any path containing it."
    )]
    pub strict_ancestry: bool,
    #[arg(
        long,
        overrides_with = "strict_ancestry",
        help = "Treat any path containing a directory as covered by it, even if the config file sets `strict_ancestry`."
    )]
    pub no_strict_ancestry: bool,
    #[arg(short, long, help = "Write without asking for confirmation.")]
    pub yes: bool,
    #[arg(long, conflicts_with = "json", help = "Print the script to stdout instead of writing it.")]
    pub print: bool,
    #[arg(long, help = "Print the relocation plan as JSON instead of writing the script.")]
    pub json: bool,
    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Enable debug logging. Overrides `verbose` from the config file."
    )]
    pub verbose: bool,
    #[arg(
        long,
        value_name = "PATH",
        help = "Path to a TOML config file. When omitted, SCRATCHJOB_CONFIG_PATH is used if set, otherwise the default config file location if available."
    )]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, value_name = "SHELL", help = "Print shell completions and exit.")]
    pub completions: Option<Shell>,
}

pub struct ParsedOpts {
    pub opts: Opts,
    pub overrides: Overrides,
}

impl ParsedOpts {
    pub fn from_opts(opts: Opts) -> Self {
        let overrides = Overrides {
            partition: opts.partition.clone(),
            account: opts.account.clone(),
            torque: toggle(opts.torque, opts.no_torque),
            clear_scratch: toggle(opts.clear_scratch, opts.no_clear_scratch),
            strict_ancestry: toggle(opts.strict_ancestry, opts.no_strict_ancestry),
            verbose: opts.verbose.then_some(true),
        };
        Self { opts, overrides }
    }
}

/// `--x` / `--no-x` pairs override each other, so at most one is set.
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

pub fn cli_command() -> clap::Command {
    Opts::command()
}

pub fn parse_opts() -> ParsedOpts {
    let matches = cli_command().get_matches();
    let opts = Opts::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    ParsedOpts::from_opts(opts)
}

pub fn print_completions(shell: Shell) {
    let mut cmd = cli_command();
    clap_complete::generate(shell, &mut cmd, "scratchjob", &mut std::io::stdout());
}

/// Combine the flags with the loaded configuration into a use-case request.
pub fn build_request(
    opts: &Opts,
    config: &Config,
    host_has_tmpdir: bool,
) -> AppResult<GenerateRequest> {
    let input = opts
        .input
        .clone()
        .ok_or_else(|| AppError::invalid_argument("--input is required"))?;
    let name = opts
        .job
        .clone()
        .ok_or_else(|| AppError::invalid_argument("--job is required"))?;

    let mut job = JobSpec::new(name);
    job.account = config.account.clone();
    job.partition = config.partition.clone();
    job.nnodes = opts.nnodes;
    job.cpus = opts.cpus;
    job.walltime_hours = opts.time;
    if let Some(words) = &opts.mem {
        job.mem = parse_memory("--mem", words)?;
    }
    if let Some(words) = &opts.mem_per_cpu {
        job.mem_per_cpu = Some(parse_memory("--mem-per-cpu", words)?);
    }
    job.nodes = opts.nodes.clone();
    job.gpu = opts.gpu;
    job.conda_env = opts.env.clone();
    job.workdir = opts.workdir.clone();
    job.tmp = opts.tmp.clone();
    if opts.email {
        let address = config.email.clone().ok_or_else(|| {
            AppError::invalid_argument("--email needs an `email` address in the config file")
        })?;
        job.email = Some(address);
    }

    let scratch = ScratchMode::resolve(
        ScratchRequest {
            local_gb: opts.localscratch,
            cluster: opts.scratch,
            user: opts.userscratch,
        },
        &config.scratch_roots(),
    );
    if !scratch.is_active() && (!opts.include.is_empty() || !opts.exclude.is_empty()) {
        tracing::warn!("--include and --exclude have no effect without a scratch location");
    }

    Ok(GenerateRequest {
        job,
        input,
        output: opts.output.clone(),
        output_dir: opts.dir.clone(),
        extra_paths: opts.paths.clone(),
        scratch,
        scheduler: Scheduler::from_torque_flag(config.torque),
        include: opts.include.clone(),
        exclude: opts.exclude.clone(),
        clear_scratch: config.clear_scratch,
        containment: ContainmentRule::from_strict_flag(config.strict_ancestry),
        host_has_tmpdir,
    })
}

fn parse_memory(flag: &str, words: &[String]) -> AppResult<MemorySpec> {
    words
        .join(" ")
        .parse()
        .map_err(|err| AppError::invalid_argument(format!("{flag}: {err}")))
}
