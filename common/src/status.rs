use crate::job::JobState;
use chrono::{DateTime, Local};

/// Badge styling bucket for a job state or execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusVariant {
    Success,
    Error,
    Warning,
    Info,
    Default,
}

impl StatusVariant {
    pub fn for_state(state: Option<JobState>) -> Self {
        match state {
            Some(JobState::Success) => StatusVariant::Success,
            Some(JobState::Failed) => StatusVariant::Error,
            Some(JobState::Running) => StatusVariant::Info,
            Some(JobState::Waiting) => StatusVariant::Warning,
            _ => StatusVariant::Default,
        }
    }

    /// Execution statuses are free text, so anything unrecognised is `Default`.
    pub fn for_status(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "SUCCESS" => StatusVariant::Success,
            "FAILED" => StatusVariant::Error,
            "RUNNING" => StatusVariant::Info,
            "WAITING" => StatusVariant::Warning,
            _ => StatusVariant::Default,
        }
    }
}

/// Placeholder shown for absent values.
pub const MISSING: &str = "-";

pub fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

/// Render a server timestamp in local time when it is RFC 3339, else verbatim.
pub fn format_timestamp(value: Option<&str>) -> String {
    match value {
        Some(raw) if !raw.trim().is_empty() => match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => raw.to_string(),
        },
        _ => MISSING.to_string(),
    }
}
