// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::types::{JobSpec, ScratchMode, Scheduler};

/// Where the scheduler writes the job's stdout and stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    /// As the scheduler expects them in a directive (`%j` placeholders).
    pub stdout: String,
    pub stderr: String,
    /// The same paths spelled with shell variables, for echo lines.
    pub stdout_shell: String,
    pub stderr_shell: String,
}

impl LogPaths {
    pub fn new(job: &str, scheduler: Scheduler, output_dir: &str) -> Self {
        let dir = output_dir.trim_end_matches('/');
        match scheduler {
            Scheduler::Slurm => {
                let shell = format!("{dir}/{job}_${{{}}}", scheduler.job_id_var());
                Self {
                    stdout: format!("{dir}/{job}_%j.o"),
                    stderr: format!("{dir}/{job}_%j.e"),
                    stdout_shell: format!("{shell}.o"),
                    stderr_shell: format!("{shell}.e"),
                }
            }
            Scheduler::Torque => Self {
                stdout: format!("{dir}/{job}.o"),
                stderr: format!("{dir}/{job}.e"),
                stdout_shell: format!("{dir}/{job}.o"),
                stderr_shell: format!("{dir}/{job}.e"),
            },
        }
    }
}

/// Scheduler header lines for `job`, starting with the shebang.
pub fn directives(
    job: &JobSpec,
    scheduler: Scheduler,
    scratch: &ScratchMode,
    output_dir: &str,
) -> Vec<String> {
    let p = scheduler.directive_prefix();
    let torque = scheduler == Scheduler::Torque;
    let mut out = vec!["#!/bin/bash".to_string()];

    if torque {
        out.push(format!("{p} -N {}", job.name));
    } else {
        out.push(format!("{p} --job-name={}", job.name));
    }
    if let Some(account) = &job.account {
        if torque {
            out.push(format!("{p} -A {account}"));
        } else {
            out.push(format!("{p} --account={account}"));
        }
    }
    if torque {
        out.push(format!("{p} -q {}", job.partition));
    } else {
        out.push(format!("{p} --partition={}", job.partition));
    }

    out.extend(node_lines(job, scheduler));

    let mem = job.mem_per_cpu.unwrap_or(job.mem);
    let per_cpu = job.mem_per_cpu.is_some();
    out.push(match (torque, per_cpu) {
        (false, false) => format!("{p} --mem={}", mem.slurm()),
        (false, true) => format!("{p} --mem-per-cpu={}", mem.slurm()),
        (true, false) => format!("{p} -l mem={}", mem.torque()),
        (true, true) => format!("{p} -l pmem={}", mem.torque()),
    });

    let walltime = format!("{}:00:00", job.walltime_hours);
    if torque {
        out.push(format!("{p} -l walltime={walltime}"));
    } else {
        out.push(format!("{p} --time={walltime}"));
    }

    if job.gpu {
        if torque {
            out.push(format!("{p} -l gpus=1"));
        } else {
            out.push(format!("{p} --gres=gpu:1"));
        }
    }

    if let Some(size_gb) = scratch.local_size_gb() {
        if torque {
            tracing::warn!(size_gb, "local scratch size is not requested on torque");
        } else {
            out.push(format!("{p} --gres=localscratch:{size_gb}G"));
        }
    }

    if let Some(email) = &job.email {
        if torque {
            out.push(format!("{p} -M {email}"));
            out.push(format!("{p} -m ae"));
        } else {
            out.push(format!("{p} --mail-user={email}"));
            out.push(format!("{p} --mail-type=END,FAIL"));
        }
    }

    let logs = LogPaths::new(&job.name, scheduler, output_dir);
    if torque {
        out.push(format!("{p} -o {}", logs.stdout));
        out.push(format!("{p} -e {}", logs.stderr));
    } else {
        out.push(format!("{p} --output={}", logs.stdout));
        out.push(format!("{p} --error={}", logs.stderr));
    }
    out
}

fn node_lines(job: &JobSpec, scheduler: Scheduler) -> Vec<String> {
    let p = scheduler.directive_prefix();
    match scheduler {
        Scheduler::Torque if !job.nodes.is_empty() => {
            vec![format!("{p} -l nodes={}:ppn={}", job.nodes.join("+"), job.cpus)]
        }
        Scheduler::Torque => vec![format!("{p} -l nodes={}:ppn={}", job.nnodes, job.cpus)],
        Scheduler::Slurm if !job.nodes.is_empty() => {
            let mut lines = vec![format!("{p} --nodelist={}", job.nodes.join(","))];
            if job.cpus > 1 {
                lines.push(format!("{p} --ntasks-per-node={}", job.cpus));
            }
            lines
        }
        Scheduler::Slurm => match (job.nnodes > 1, job.cpus > 1) {
            (true, true) => vec![
                format!("{p} --nodes={}", job.nnodes),
                format!("{p} --ntasks-per-node={}", job.cpus),
            ],
            (true, false) => vec![format!("{p} --nodes={}", job.nnodes)],
            (false, true) => vec![format!("{p} --ntasks={}", job.cpus)],
            (false, false) => vec![format!("{p} --ntasks=1")],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::types::{MemorySpec, MemoryUnit};

    #[test]
    fn slurm_defaults() {
        let job = JobSpec::new("align");
        let lines = directives(&job, Scheduler::Slurm, &ScratchMode::None, "/home/me/logs/");
        assert_eq!(
            lines,
            vec![
                "#!/bin/bash",
                "#SBATCH --job-name=align",
                "#SBATCH --partition=normal",
                "#SBATCH --ntasks=1",
                "#SBATCH --mem=500M",
                "#SBATCH --time=1:00:00",
                "#SBATCH --output=/home/me/logs/align_%j.o",
                "#SBATCH --error=/home/me/logs/align_%j.e",
            ]
        );
    }

    #[test]
    fn slurm_nodes_and_tasks_are_separate_lines() {
        let mut job = JobSpec::new("mpi");
        job.nnodes = 4;
        job.cpus = 16;
        let lines = directives(&job, Scheduler::Slurm, &ScratchMode::None, "/logs");
        assert!(lines.contains(&"#SBATCH --nodes=4".to_string()));
        assert!(lines.contains(&"#SBATCH --ntasks-per-node=16".to_string()));
        assert!(!lines.iter().any(|l| l.contains("--ntasks=")));
    }

    #[test]
    fn slurm_optional_requests() {
        let mut job = JobSpec::new("gpu");
        job.account = Some("lab".to_string());
        job.cpus = 8;
        job.mem_per_cpu = Some(MemorySpec::new(4, MemoryUnit::Gb));
        job.gpu = true;
        job.email = Some("me@example.org".to_string());
        job.walltime_hours = 24;
        let scratch = ScratchMode::Local {
            root: "/localscratch".to_string(),
            size_gb: 50,
        };

        let lines = directives(&job, Scheduler::Slurm, &scratch, "/logs");

        for expected in [
            "#SBATCH --account=lab",
            "#SBATCH --ntasks=8",
            "#SBATCH --mem-per-cpu=4G",
            "#SBATCH --time=24:00:00",
            "#SBATCH --gres=gpu:1",
            "#SBATCH --gres=localscratch:50G",
            "#SBATCH --mail-user=me@example.org",
            "#SBATCH --mail-type=END,FAIL",
        ] {
            assert!(lines.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!lines.iter().any(|l| l.starts_with("#SBATCH --mem=")));
    }

    #[test]
    fn slurm_nodelist_replaces_node_count() {
        let mut job = JobSpec::new("pinned");
        job.nnodes = 3;
        job.cpus = 2;
        job.nodes = vec!["n01".to_string(), "n02".to_string()];
        let lines = directives(&job, Scheduler::Slurm, &ScratchMode::None, "/logs");
        assert_eq!(lines[3], "#SBATCH --nodelist=n01,n02");
        assert_eq!(lines[4], "#SBATCH --ntasks-per-node=2");
        assert!(!lines.iter().any(|l| l.contains("--nodes=")));
    }

    #[test]
    fn torque_header() {
        let mut job = JobSpec::new("assemble");
        job.account = Some("lab".to_string());
        job.nnodes = 2;
        job.cpus = 4;
        job.mem = MemorySpec::new(16, MemoryUnit::Gb);
        job.email = Some("me@example.org".to_string());

        let lines = directives(&job, Scheduler::Torque, &ScratchMode::None, "/logs");

        assert_eq!(
            lines,
            vec![
                "#!/bin/bash",
                "#PBS -N assemble",
                "#PBS -A lab",
                "#PBS -q normal",
                "#PBS -l nodes=2:ppn=4",
                "#PBS -l mem=16gb",
                "#PBS -l walltime=1:00:00",
                "#PBS -M me@example.org",
                "#PBS -m ae",
                "#PBS -o /logs/assemble.o",
                "#PBS -e /logs/assemble.e",
            ]
        );
    }

    #[test]
    fn torque_nodelist_and_pmem() {
        let mut job = JobSpec::new("pinned");
        job.cpus = 2;
        job.nodes = vec!["n01".to_string(), "n02".to_string()];
        job.mem_per_cpu = Some(MemorySpec::new(800, MemoryUnit::Mb));
        let lines = directives(&job, Scheduler::Torque, &ScratchMode::None, "/logs");
        assert!(lines.contains(&"#PBS -l nodes=n01+n02:ppn=2".to_string()));
        assert!(lines.contains(&"#PBS -l pmem=800mb".to_string()));
    }

    #[test]
    fn log_paths_have_shell_spellings() {
        let logs = LogPaths::new("job", Scheduler::Slurm, "/out");
        assert_eq!(logs.stdout_shell, "/out/job_${SLURM_JOB_ID}.o");
        assert_eq!(logs.stderr_shell, "/out/job_${SLURM_JOB_ID}.e");
        let logs = LogPaths::new("job", Scheduler::Torque, "/out");
        assert_eq!(logs.stdout, logs.stdout_shell);
    }
}
