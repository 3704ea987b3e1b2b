use clap::ValueEnum;
use common::{Job, JobExecution};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

pub fn jobs_csv(jobs: &[Job]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["id", "name", "type", "state", "last_action", "last_action_time", "last_modified_by"])?;
    for job in jobs {
        let state = job.state.map(|s| s.to_string()).unwrap_or_default();
        wtr.write_record([
            job.id.to_string().as_str(),
            job.name.as_str(),
            opt(&job.job_type),
            state.as_str(),
            opt(&job.last_action),
            opt(&job.last_action_time),
            opt(&job.last_modified_by),
        ])?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub fn executions_csv(executions: &[JobExecution]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["id", "job_id", "status", "started_at", "finished_at", "action", "triggered_by"])?;
    for exec in executions {
        let job_id = exec.job.as_ref().map(|j| j.id.to_string()).unwrap_or_default();
        wtr.write_record([
            exec.id.to_string().as_str(),
            job_id.as_str(),
            exec.status.as_str(),
            opt(&exec.started_at),
            opt(&exec.finished_at),
            opt(&exec.action),
            opt(&exec.triggered_by),
        ])?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}
