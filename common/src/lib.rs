pub mod job;
pub mod route;
pub mod status;

pub use job::{ActingUser, ActionKind, BlankUser, Job, JobAction, JobExecution, JobId, JobState, NewJob};
pub use route::Route;
pub use status::{format_timestamp, or_missing, StatusVariant};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
pub const API_PREFIX: &str = "/api";

pub const DEFAULT_CONFIG_PATH: &str = "/etc/jobctl/config.yaml";
pub const USER_CONFIG_PATH: &str = "~/.config/jobctl/config.yaml";

pub const CONFIG_ENV: &str = "JOBCTL_CONFIG";
pub const API_URL_ENV: &str = "JOBCTL_API_URL";
pub const USER_ENV: &str = "JOBCTL_USER";
pub const LOG_ENV: &str = "JOBCTL_LOG";
