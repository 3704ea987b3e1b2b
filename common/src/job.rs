use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(JobId)
    }
}

/// Server-owned lifecycle state. The client never writes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Waiting,
    Running,
    Success,
    Failed,
    Cancelled,
    Manual,
    #[serde(other)]
    Unknown,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Waiting => "WAITING",
            JobState::Running => "RUNNING",
            JobState::Success => "SUCCESS",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
            JobState::Manual => "MANUAL",
            JobState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobAction {
    None,
    Cancel,
    Manual,
    ForceRun,
    Run,
    Clean,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executions: Option<Vec<JobExecution>>,
    /// Embedded snapshot of the upstream job; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Box<Job>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<JobAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_pool: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_host: Option<String>,
}

impl Job {
    /// Minimal job as the server would echo it back; handy for fixtures.
    pub fn named(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: JobId(id),
            name: name.into(),
            description: None,
            job_type: None,
            payload: None,
            created_at: None,
            updated_at: None,
            executions: None,
            dependency: None,
            state: None,
            action: None,
            submitted_by: None,
            last_modified_by: None,
            last_action: None,
            last_action_time: None,
            host_pool: None,
            assigned_host: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobExecution {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<Box<Job>>,
    /// Free text; the state vocabulary only drives styling.
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Registration body. Everything except `name` is optional free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewJob {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Identity recorded by the server as the author of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActingUser(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankUser;

impl std::fmt::Display for BlankUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("User is required")
    }
}

impl std::error::Error for BlankUser {}

impl ActingUser {
    pub fn new(name: impl AsRef<str>) -> Result<Self, BlankUser> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(BlankUser);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActingUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ActingUser {
    type Err = BlankUser;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActingUser::new(s)
    }
}

/// Control actions a user can trigger against a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Run,
    Kill,
    Clean,
    Manual,
    ForceRun,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Run,
        ActionKind::Kill,
        ActionKind::Clean,
        ActionKind::Manual,
        ActionKind::ForceRun,
    ];

    /// The subset offered inline on each row of the job list.
    pub const ROW_ACTIONS: [ActionKind; 3] = [ActionKind::Run, ActionKind::Kill, ActionKind::Clean];

    /// Path segment under `/jobs/{id}/`.
    pub fn segment(&self) -> &'static str {
        match self {
            ActionKind::Run => "run",
            ActionKind::Kill => "kill",
            ActionKind::Clean => "clean",
            ActionKind::Manual => "manual",
            ActionKind::ForceRun => "force-run",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Run => "Run",
            ActionKind::Kill => "Kill",
            ActionKind::Clean => "Clean",
            ActionKind::Manual => "Manual",
            ActionKind::ForceRun => "Force Run",
        }
    }

    pub fn failure_message(&self) -> String {
        format!("Failed to {} job", self.segment())
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run" => Ok(ActionKind::Run),
            "kill" => Ok(ActionKind::Kill),
            "clean" => Ok(ActionKind::Clean),
            "manual" => Ok(ActionKind::Manual),
            "force-run" | "force_run" | "forcerun" => Ok(ActionKind::ForceRun),
            other => Err(format!("Unknown action: {}", other)),
        }
    }
}
