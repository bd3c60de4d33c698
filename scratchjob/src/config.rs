// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::app::types::ScratchRoots;

const APP_DIR_NAME: &str = "scratchjob";
const CONFIG_FILE_NAME: &str = "scratchjob.toml";
const CONFIG_ENV_VAR: &str = "SCRATCHJOB_CONFIG_PATH";
const DEFAULT_SCRATCH_ROOT: &str = "/cluster/work/jobs";
const DEFAULT_USERSCRATCH_ROOT: &str = "/cluster/work/users/${USER}";
const DEFAULT_LOCALSCRATCH_ROOT: &str = "/localscratch";
const DEFAULT_PARTITION: &str = "normal";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    scratch_root: Option<String>,
    userscratch_root: Option<String>,
    localscratch_root: Option<String>,
    partition: Option<String>,
    account: Option<String>,
    email: Option<String>,
    torque: Option<bool>,
    clear_scratch: Option<bool>,
    strict_ancestry: Option<bool>,
    verbose: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scratch_root: String,
    pub userscratch_root: String,
    pub localscratch_root: String,
    pub partition: String,
    pub account: Option<String>,
    /// Address used when `--email` asks for notifications.
    pub email: Option<String>,
    pub torque: bool,
    pub clear_scratch: bool,
    pub strict_ancestry: bool,
    pub verbose: bool,
}

impl Config {
    pub fn scratch_roots(&self) -> ScratchRoots {
        ScratchRoots {
            cluster: self.scratch_root.clone(),
            user: self.userscratch_root.clone(),
            local: self.localscratch_root.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Override,
    Env,
    ConfigFile,
    Default,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Override => "override",
            ConfigSource::Env => "env",
            ConfigSource::ConfigFile => "config",
            ConfigSource::Default => "default",
        }
    }
}

#[derive(Debug)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

#[derive(Debug)]
pub struct ConfigReport {
    pub config_path: Option<PathBuf>,
    pub config_path_source: Option<ConfigSource>,
    pub config_file_present: bool,
    pub scratch_root: ConfigValue<String>,
    pub userscratch_root: ConfigValue<String>,
    pub localscratch_root: ConfigValue<String>,
    pub partition: ConfigValue<String>,
    pub account: ConfigValue<Option<String>>,
    pub email: ConfigValue<Option<String>>,
    pub torque: ConfigValue<bool>,
    pub clear_scratch: ConfigValue<bool>,
    pub strict_ancestry: ConfigValue<bool>,
    pub verbose: ConfigValue<bool>,
}

impl ConfigReport {
    pub fn log(&self) {
        match (&self.config_path, self.config_path_source) {
            (Some(path), Some(source)) => tracing::info!(
                path = %path.display(),
                source = source.as_str(),
                present = self.config_file_present,
                "config path"
            ),
            (Some(path), None) => tracing::info!(
                path = %path.display(),
                present = self.config_file_present,
                "config path"
            ),
            (None, _) => tracing::info!("config path: (none)"),
        }
        log_value("scratch_root", &self.scratch_root);
        log_value("userscratch_root", &self.userscratch_root);
        log_value("localscratch_root", &self.localscratch_root);
        log_value("partition", &self.partition);
        log_value("account", &self.account);
        log_value("email", &self.email);
        log_value("torque", &self.torque);
        log_value("clear_scratch", &self.clear_scratch);
        log_value("strict_ancestry", &self.strict_ancestry);
        log_value("verbose", &self.verbose);
    }
}

fn log_value<T: std::fmt::Debug>(key: &str, value: &ConfigValue<T>) {
    tracing::info!(
        key,
        value = ?value.value,
        source = value.source.as_str(),
        "config value"
    );
}

#[derive(Debug)]
pub struct LoadResult {
    pub config: Config,
    pub report: ConfigReport,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub partition: Option<String>,
    pub account: Option<String>,
    pub torque: Option<bool>,
    pub clear_scratch: Option<bool>,
    pub strict_ancestry: Option<bool>,
    pub verbose: Option<bool>,
}

pub fn load_with_report(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<LoadResult> {
    let (config_path, config_path_source, required) = match config_path_override {
        Some(path) => (Some(expand_path(path)), Some(ConfigSource::Override), true),
        None => match config_path_from_env()? {
            Some(path) => (Some(expand_path(path)), Some(ConfigSource::Env), true),
            None => match default_config_path().ok() {
                Some(path) => (Some(path), Some(ConfigSource::Default), false),
                None => (None, None, false),
            },
        },
    };
    let config_file_present = config_path
        .as_deref()
        .map(|path| path.exists())
        .unwrap_or(false);

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };

    let scratch_root = root_value(file_config.scratch_root, DEFAULT_SCRATCH_ROOT);
    let userscratch_root = root_value(file_config.userscratch_root, DEFAULT_USERSCRATCH_ROOT);
    let localscratch_root =
        root_value(file_config.localscratch_root, DEFAULT_LOCALSCRATCH_ROOT);
    let partition = layered(
        overrides.partition,
        file_config.partition,
        DEFAULT_PARTITION.to_string(),
    );
    if partition.value.trim().is_empty() {
        anyhow::bail!("partition must not be empty");
    }
    let account = optional(overrides.account, file_config.account);
    let email = optional(None, file_config.email);
    let torque = layered(overrides.torque, file_config.torque, false);
    let clear_scratch = layered(overrides.clear_scratch, file_config.clear_scratch, false);
    let strict_ancestry =
        layered(overrides.strict_ancestry, file_config.strict_ancestry, false);
    let verbose = layered(overrides.verbose, file_config.verbose, false);

    let config = Config {
        scratch_root: scratch_root.value.clone(),
        userscratch_root: userscratch_root.value.clone(),
        localscratch_root: localscratch_root.value.clone(),
        partition: partition.value.clone(),
        account: account.value.clone(),
        email: email.value.clone(),
        torque: torque.value,
        clear_scratch: clear_scratch.value,
        strict_ancestry: strict_ancestry.value,
        verbose: verbose.value,
    };

    let report = ConfigReport {
        config_path,
        config_path_source,
        config_file_present,
        scratch_root,
        userscratch_root,
        localscratch_root,
        partition,
        account,
        email,
        torque,
        clear_scratch,
        strict_ancestry,
        verbose,
    };

    Ok(LoadResult { config, report })
}

fn layered<T>(flag: Option<T>, file: Option<T>, default: T) -> ConfigValue<T> {
    match (flag, file) {
        (Some(value), _) => ConfigValue {
            value,
            source: ConfigSource::Override,
        },
        (None, Some(value)) => ConfigValue {
            value,
            source: ConfigSource::ConfigFile,
        },
        (None, None) => ConfigValue {
            value: default,
            source: ConfigSource::Default,
        },
    }
}

fn optional(flag: Option<String>, file: Option<String>) -> ConfigValue<Option<String>> {
    let file = file.filter(|value| !value.trim().is_empty());
    match (flag, file) {
        (Some(value), _) => ConfigValue {
            value: Some(value),
            source: ConfigSource::Override,
        },
        (None, Some(value)) => ConfigValue {
            value: Some(value),
            source: ConfigSource::ConfigFile,
        },
        (None, None) => ConfigValue {
            value: None,
            source: ConfigSource::Default,
        },
    }
}

/// Scratch roots end up verbatim in the script, so only `~` is expanded and
/// shell variables such as `${USER}` are left for the job to resolve.
fn root_value(raw: Option<String>, default: &str) -> ConfigValue<String> {
    match raw {
        Some(raw) => ConfigValue {
            value: shellexpand::tilde(raw.trim_end_matches('/')).into_owned(),
            source: ConfigSource::ConfigFile,
        },
        None => ConfigValue {
            value: default.to_string(),
            source: ConfigSource::Default,
        },
    }
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn config_path_from_env() -> Result<Option<PathBuf>> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) => {
            if value.is_empty() {
                anyhow::bail!("{CONFIG_ENV_VAR} is set but empty");
            }
            Ok(Some(PathBuf::from(value)))
        }
        None => Ok(None),
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        prev: Option<OsString>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var_os(key);
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn clear(key: &'static str) -> Self {
            let prev = std::env::var_os(key);
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe {
                match &self.prev {
                    Some(value) => std::env::set_var(self.key, value),
                    None => std::env::remove_var(self.key),
                }
            }
        }
    }

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("scratchjob.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_optional_config_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let cfg = read_config_file(&dir.path().join("missing.toml"), false).unwrap();
        assert!(cfg.scratch_root.is_none());
        assert!(cfg.partition.is_none());
    }

    #[test]
    fn missing_required_config_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = read_config_file(&dir.path().join("missing.toml"), true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "scratch_dir = \"/typo\"\n");
        let err = load_with_report(Some(path), Overrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains("scratch_dir"));
    }

    #[test]
    fn defaults_apply_to_an_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");
        let LoadResult { config, report } =
            load_with_report(Some(path), Overrides::default()).unwrap();

        assert_eq!(config.scratch_root, DEFAULT_SCRATCH_ROOT);
        assert_eq!(config.userscratch_root, "/cluster/work/users/${USER}");
        assert_eq!(config.localscratch_root, DEFAULT_LOCALSCRATCH_ROOT);
        assert_eq!(config.partition, "normal");
        assert!(config.account.is_none());
        assert!(!config.torque);
        assert!(!config.clear_scratch);
        assert_eq!(report.partition.source, ConfigSource::Default);
        assert!(report.config_file_present);
        assert_eq!(report.config_path_source, Some(ConfigSource::Override));
    }

    #[test]
    fn file_values_are_read() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "scratch_root = \"/scratch/jobs/\"\n\
             localscratch_root = \"~/local\"\n\
             partition = \"long\"\n\
             account = \"lab\"\n\
             email = \"me@example.org\"\n\
             torque = true\n\
             strict_ancestry = true\n",
        );
        let LoadResult { config, report } =
            load_with_report(Some(path), Overrides::default()).unwrap();

        assert_eq!(config.scratch_root, "/scratch/jobs");
        assert!(!config.localscratch_root.starts_with('~'));
        assert!(config.localscratch_root.ends_with("/local"));
        assert_eq!(config.partition, "long");
        assert_eq!(config.account.as_deref(), Some("lab"));
        assert_eq!(config.email.as_deref(), Some("me@example.org"));
        assert!(config.torque);
        assert!(config.strict_ancestry);
        assert_eq!(report.torque.source, ConfigSource::ConfigFile);
        assert_eq!(report.clear_scratch.source, ConfigSource::Default);
    }

    #[test]
    fn overrides_take_precedence_per_field() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "partition = \"long\"\naccount = \"lab\"\ntorque = true\nverbose = true\n",
        );
        let LoadResult { config, report } = load_with_report(
            Some(path),
            Overrides {
                partition: Some("short".to_string()),
                torque: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.partition, "short");
        assert_eq!(report.partition.source, ConfigSource::Override);
        assert!(!config.torque);
        assert_eq!(config.account.as_deref(), Some("lab"));
        assert!(config.verbose);
        assert_eq!(report.verbose.source, ConfigSource::ConfigFile);
    }

    #[test]
    fn empty_partition_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "partition = \" \"\n");
        assert!(load_with_report(Some(path), Overrides::default()).is_err());
    }

    #[test]
    fn env_config_path_used_when_no_override() {
        let _lock = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "partition = \"from_env\"\n");
        let _guard = EnvVarGuard::set(CONFIG_ENV_VAR, path.to_str().unwrap());

        let LoadResult { config, report } = load_with_report(None, Overrides::default()).unwrap();

        assert_eq!(config.partition, "from_env");
        assert_eq!(report.config_path_source, Some(ConfigSource::Env));
    }

    #[test]
    fn cli_config_path_takes_precedence_over_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        let env_dir = TempDir::new().unwrap();
        let env_path = write_config(&env_dir, "partition = \"from_env\"\n");
        let cli_dir = TempDir::new().unwrap();
        let cli_path = write_config(&cli_dir, "partition = \"from_cli\"\n");
        let _guard = EnvVarGuard::set(CONFIG_ENV_VAR, env_path.to_str().unwrap());

        let config = load_with_report(Some(cli_path), Overrides::default())
            .unwrap()
            .config;

        assert_eq!(config.partition, "from_cli");
    }

    #[test]
    fn empty_env_config_path_is_an_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvVarGuard::set(CONFIG_ENV_VAR, "");
        assert!(load_with_report(None, Overrides::default()).is_err());
    }

    #[test]
    fn missing_env_config_path_is_an_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let guard = EnvVarGuard::set(CONFIG_ENV_VAR, missing.to_str().unwrap());
        assert!(load_with_report(None, Overrides::default()).is_err());
        drop(guard);
        let _cleared = EnvVarGuard::clear(CONFIG_ENV_VAR);
        assert!(config_path_from_env().unwrap().is_none());
    }
}
