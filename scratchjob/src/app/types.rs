// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Batch scheduler the generated script targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheduler {
    Slurm,
    Torque,
}

impl Scheduler {
    pub fn from_torque_flag(torque: bool) -> Self {
        if torque {
            Scheduler::Torque
        } else {
            Scheduler::Slurm
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheduler::Slurm => "slurm",
            Scheduler::Torque => "torque",
        }
    }

    /// Variable holding the directory the job was submitted from.
    pub fn submit_dir_var(self) -> &'static str {
        match self {
            Scheduler::Slurm => "SLURM_SUBMIT_DIR",
            Scheduler::Torque => "PBS_O_WORKDIR",
        }
    }

    pub fn job_id_var(self) -> &'static str {
        match self {
            Scheduler::Slurm => "SLURM_JOB_ID",
            Scheduler::Torque => "PBS_JOBID",
        }
    }

    pub fn node_list_var(self) -> &'static str {
        match self {
            Scheduler::Slurm => "SLURM_JOB_NODELIST",
            Scheduler::Torque => "PBS_NODEFILE",
        }
    }

    pub fn directive_prefix(self) -> &'static str {
        match self {
            Scheduler::Slurm => "#SBATCH",
            Scheduler::Torque => "#PBS",
        }
    }

    pub fn script_extension(self) -> &'static str {
        match self {
            Scheduler::Slurm => "slm",
            Scheduler::Torque => "pbs",
        }
    }
}

/// Where the job computes, and therefore where its data is staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScratchMode {
    /// Compute in the submission directory; nothing is moved.
    None,
    /// Cluster-provided scratch, created for the job.
    Cluster { root: String },
    /// Persistent per-user scratch.
    User { root: String },
    /// Node-local scratch with a size request in GB.
    Local { root: String, size_gb: u32 },
}

/// Scratch locations requested on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScratchRequest {
    pub local_gb: Option<u32>,
    pub cluster: bool,
    pub user: bool,
}

/// Root directories of each scratch filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchRoots {
    pub cluster: String,
    pub user: String,
    pub local: String,
}

impl ScratchMode {
    /// Pick one scratch location. Local scratch wins over cluster scratch,
    /// which wins over user scratch.
    pub fn resolve(request: ScratchRequest, roots: &ScratchRoots) -> Self {
        if let Some(size_gb) = request.local_gb {
            return ScratchMode::Local {
                root: roots.local.clone(),
                size_gb,
            };
        }
        if request.cluster {
            return ScratchMode::Cluster {
                root: roots.cluster.clone(),
            };
        }
        if request.user {
            return ScratchMode::User {
                root: roots.user.clone(),
            };
        }
        ScratchMode::None
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, ScratchMode::None)
    }

    pub fn root(&self) -> Option<&str> {
        match self {
            ScratchMode::None => None,
            ScratchMode::Cluster { root }
            | ScratchMode::User { root }
            | ScratchMode::Local { root, .. } => Some(root.as_str()),
        }
    }

    pub fn local_size_gb(&self) -> Option<u32> {
        match self {
            ScratchMode::Local { size_gb, .. } => Some(*size_gb),
            _ => None,
        }
    }

    /// The per-job scratch directory spelled out with the scheduler's job id
    /// variable, e.g. `/cluster/work/jobs/${SLURM_JOB_ID}`. Usable anywhere in
    /// the script, before or after `SCRATCH_DIR` is defined.
    pub fn job_dir(&self, scheduler: Scheduler) -> Option<String> {
        self.root().map(|root| {
            format!(
                "{}/${{{}}}",
                root.trim_end_matches('/'),
                scheduler.job_id_var()
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemoryUnit {
    Mb,
    Gb,
}

/// A memory request such as `500 MB` or `4 GB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemorySpec {
    pub amount: u64,
    pub unit: MemoryUnit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MemoryParseError {
    #[error("memory request is empty")]
    Empty,
    #[error("invalid memory amount '{0}'")]
    InvalidAmount(String),
    #[error("invalid memory unit '{0}' (expected MB or GB)")]
    InvalidUnit(String),
}

impl MemorySpec {
    pub fn new(amount: u64, unit: MemoryUnit) -> Self {
        Self { amount, unit }
    }

    /// Slurm notation: `500M`, `4G`.
    pub fn slurm(&self) -> String {
        match self.unit {
            MemoryUnit::Mb => format!("{}M", self.amount),
            MemoryUnit::Gb => format!("{}G", self.amount),
        }
    }

    /// Torque notation: `500mb`, `4gb`.
    pub fn torque(&self) -> String {
        match self.unit {
            MemoryUnit::Mb => format!("{}mb", self.amount),
            MemoryUnit::Gb => format!("{}gb", self.amount),
        }
    }
}

impl fmt::Display for MemorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            MemoryUnit::Mb => write!(f, "{} MB", self.amount),
            MemoryUnit::Gb => write!(f, "{} GB", self.amount),
        }
    }
}

impl FromStr for MemorySpec {
    type Err = MemoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(MemoryParseError::Empty);
        }
        let split = compact
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(compact.len());
        let (digits, unit) = compact.split_at(split);
        let amount = digits
            .parse::<u64>()
            .map_err(|_| MemoryParseError::InvalidAmount(digits.to_string()))?;
        if amount == 0 {
            return Err(MemoryParseError::InvalidAmount(digits.to_string()));
        }
        let unit = match unit.to_ascii_lowercase().as_str() {
            "mb" | "m" => MemoryUnit::Mb,
            "gb" | "g" => MemoryUnit::Gb,
            _ => return Err(MemoryParseError::InvalidUnit(unit.to_string())),
        };
        Ok(Self { amount, unit })
    }
}

/// Resources and environment requested for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub account: Option<String>,
    pub partition: String,
    pub nnodes: u32,
    pub cpus: u32,
    pub walltime_hours: u32,
    pub mem: MemorySpec,
    pub mem_per_cpu: Option<MemorySpec>,
    /// Explicit node names; when present they replace the node count.
    pub nodes: Vec<String>,
    pub gpu: bool,
    pub email: Option<String>,
    pub conda_env: Option<String>,
    pub workdir: Option<String>,
    pub tmp: Option<String>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account: None,
            partition: "normal".to_string(),
            nnodes: 1,
            cpus: 1,
            walltime_hours: 1,
            mem: MemorySpec::new(500, MemoryUnit::Mb),
            mem_per_cpu: None,
            nodes: Vec::new(),
            gpu: false,
            email: None,
            conda_env: None,
            workdir: None,
            tmp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> ScratchRoots {
        ScratchRoots {
            cluster: "/cluster/work/jobs".to_string(),
            user: "/cluster/work/users/me".to_string(),
            local: "/localscratch".to_string(),
        }
    }

    #[test]
    fn scratch_priority_is_local_then_cluster_then_user() {
        let all = ScratchRequest {
            local_gb: Some(10),
            cluster: true,
            user: true,
        };
        assert_eq!(
            ScratchMode::resolve(all, &roots()),
            ScratchMode::Local {
                root: "/localscratch".to_string(),
                size_gb: 10
            }
        );

        let cluster_and_user = ScratchRequest {
            cluster: true,
            user: true,
            ..Default::default()
        };
        assert_eq!(
            ScratchMode::resolve(cluster_and_user, &roots()).root(),
            Some("/cluster/work/jobs")
        );

        let user = ScratchRequest {
            user: true,
            ..Default::default()
        };
        assert_eq!(
            ScratchMode::resolve(user, &roots()).root(),
            Some("/cluster/work/users/me")
        );

        assert_eq!(
            ScratchMode::resolve(ScratchRequest::default(), &roots()),
            ScratchMode::None
        );
    }

    #[test]
    fn job_dir_uses_scheduler_job_id() {
        let mode = ScratchMode::Cluster {
            root: "/scratch/".to_string(),
        };
        assert_eq!(
            mode.job_dir(Scheduler::Slurm).as_deref(),
            Some("/scratch/${SLURM_JOB_ID}")
        );
        assert_eq!(
            mode.job_dir(Scheduler::Torque).as_deref(),
            Some("/scratch/${PBS_JOBID}")
        );
        assert_eq!(ScratchMode::None.job_dir(Scheduler::Slurm), None);
    }

    #[test]
    fn memory_spec_parses_spaced_and_compact_forms() {
        assert_eq!(
            "500 MB".parse::<MemorySpec>(),
            Ok(MemorySpec::new(500, MemoryUnit::Mb))
        );
        assert_eq!(
            "4gb".parse::<MemorySpec>(),
            Ok(MemorySpec::new(4, MemoryUnit::Gb))
        );
        assert_eq!(
            "16 G".parse::<MemorySpec>(),
            Ok(MemorySpec::new(16, MemoryUnit::Gb))
        );
    }

    #[test]
    fn memory_spec_rejects_bad_input() {
        assert_eq!("".parse::<MemorySpec>(), Err(MemoryParseError::Empty));
        assert_eq!(
            "GB".parse::<MemorySpec>(),
            Err(MemoryParseError::InvalidAmount(String::new()))
        );
        assert_eq!(
            "0 GB".parse::<MemorySpec>(),
            Err(MemoryParseError::InvalidAmount("0".to_string()))
        );
        assert_eq!(
            "5 TB".parse::<MemorySpec>(),
            Err(MemoryParseError::InvalidUnit("TB".to_string()))
        );
    }

    #[test]
    fn memory_spec_renders_per_scheduler() {
        let mem = MemorySpec::new(4, MemoryUnit::Gb);
        assert_eq!(mem.slurm(), "4G");
        assert_eq!(mem.torque(), "4gb");
        assert_eq!(mem.to_string(), "4 GB");
    }
}
