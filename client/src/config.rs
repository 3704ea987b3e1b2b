use crate::locks::LockScope;
use crate::theme::ThemePreference;
use anyhow::{Context, Result};
use common::{ActingUser, BlankUser};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String { common::DEFAULT_API_BASE.to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: ThemePreference,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ActionsConfig {
    /// Lock the whole job, not just the `(job, action)` pair, while an action is in flight.
    #[serde(default)]
    pub exclusive_per_job: bool,
}

impl ActionsConfig {
    pub fn lock_scope(&self) -> LockScope {
        if self.exclusive_per_job { LockScope::Job } else { LockScope::Pair }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionsConfig {
    #[serde(default = "default_job_id")]
    pub default_job_id: i64,
}

fn default_job_id() -> i64 { 1 }

impl Default for ExecutionsConfig {
    fn default() -> Self {
        Self {
            default_job_id: default_job_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    /// Acting user for mutating calls when none is given on the command line.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub executions: ExecutionsConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Detect file type by extension and load
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "toml" => Self::from_toml_file(path),
            _ => Err(anyhow::anyhow!("Unsupported config file format. Use .yaml, .yml, or .toml")),
        }
    }

    /// Explicit path, then `JOBCTL_CONFIG`, then the per-user and system
    /// locations; defaults when none exists. Environment overrides apply last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var(common::CONFIG_ENV)
                .ok()
                .map(|p| expand_home(&p))
                .or_else(|| {
                    [common::USER_CONFIG_PATH, common::DEFAULT_CONFIG_PATH]
                        .iter()
                        .map(|p| expand_home(p))
                        .find(|p| p.exists())
                }),
        };

        if let Some(path) = path {
            log::debug!("Loading config from {:?}", path);
            config.merge(Self::from_file(&path)?);
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge with another config, preferring values from other
    pub fn merge(&mut self, other: Config) {
        self.api.base_url = other.api.base_url;
        if other.user.is_some() {
            self.user = other.user;
        }
        self.ui.theme = other.ui.theme;

        self.logging.level = other.logging.level;
        if other.logging.output.is_some() {
            self.logging.output = other.logging.output;
        }

        self.actions.exclusive_per_job = other.actions.exclusive_per_job;
        self.executions.default_job_id = other.executions.default_job_id;
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(common::API_URL_ENV) {
            self.api.base_url = url;
        }
        if let Some(user) = var(common::USER_ENV) {
            self.user = Some(user);
        }
        if let Some(level) = var(common::LOG_ENV) {
            self.logging.level = level;
        }
    }

    /// Flag wins over configuration; a blank or missing user is rejected.
    pub fn acting_user(&self, flag: Option<&str>) -> std::result::Result<ActingUser, BlankUser> {
        match flag.or(self.user.as_deref()) {
            Some(name) => ActingUser::new(name),
            None => Err(BlankUser),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
