//! In-memory `JobsApi` used by controller tests.

use crate::error::{ApiError, Result};
use crate::jobs::{validate_registration, JobsApi};
use async_trait::async_trait;
use common::{ActingUser, ActionKind, Job, JobExecution, JobId, JobState, NewJob};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct FakeJobsApi {
    jobs: Mutex<Vec<Job>>,
    executions: Mutex<HashMap<JobId, Vec<JobExecution>>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, u16>>,
    gate: Arc<tokio::sync::Mutex<()>>,
    held_once: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

fn status_error(status: u16, path: String) -> ApiError {
    if status == 404 {
        ApiError::NotFound { path }
    } else {
        ApiError::Http {
            status,
            body: String::new(),
        }
    }
}

impl FakeJobsApi {
    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        let fake = Self::default();
        *fake.jobs.lock().unwrap() = jobs;
        fake
    }

    pub fn job(id: i64, name: &str, state: JobState) -> Job {
        let mut job = Job::named(id, name);
        job.state = Some(state);
        job
    }

    pub fn execution(id: i64, status: &str) -> JobExecution {
        JobExecution {
            id,
            job: None,
            status: status.to_string(),
            logs: None,
            started_at: None,
            finished_at: None,
            triggered_by: None,
            action: None,
        }
    }

    pub fn set_executions(&self, id: JobId, executions: Vec<JobExecution>) {
        self.executions.lock().unwrap().insert(id, executions);
    }

    pub fn fail_list(&self, status: u16) {
        self.failures.lock().unwrap().insert("list_jobs", status);
    }

    pub fn fail_get(&self, status: u16) {
        self.failures.lock().unwrap().insert("get_job", status);
    }

    pub fn fail_executions(&self, status: u16) {
        self.failures.lock().unwrap().insert("list_executions", status);
    }

    pub fn fail_actions(&self, status: u16) {
        self.failures.lock().unwrap().insert("action", status);
    }

    pub fn fail_register(&self, status: u16) {
        self.failures.lock().unwrap().insert("register_job", status);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// While the returned guard lives, every call blocks after being recorded.
    pub async fn hold(&self) -> tokio::sync::OwnedMutexGuard<()> {
        self.gate.clone().lock_owned().await
    }

    /// Blocks only the next call named `call` until the guard drops.
    pub async fn hold_next(&self, call: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let once = Arc::new(tokio::sync::Mutex::new(()));
        let guard = once.clone().lock_owned().await;
        self.held_once.lock().unwrap().insert(call.to_string(), once);
        guard
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub async fn wait_for_call(&self, call: &str) {
        while self.count(call) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    async fn enter(&self, call: String, failure_key: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        let once = self.held_once.lock().unwrap().remove(&call);
        if let Some(once) = once {
            let _pass = once.lock().await;
        }
        let _pass = self.gate.lock().await;
        let failure = self.failures.lock().unwrap().get(failure_key).copied();
        match failure {
            Some(status) => Err(status_error(status, call)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobsApi for FakeJobsApi {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.enter("list_jobs".into(), "list_jobs").await?;
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn get_job(&self, id: JobId) -> Result<Job> {
        self.enter(format!("get_job:{}", id), "get_job").await?;
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or(ApiError::NotFound {
                path: format!("/jobs/{}", id),
            })
    }

    async fn register_job(&self, job: &NewJob, user: &ActingUser) -> Result<Job> {
        validate_registration(job)?;
        self.enter(format!("register:{}:{}", job.name, user), "register_job").await?;
        let mut jobs = self.jobs.lock().unwrap();
        let next = jobs.iter().map(|j| j.id.0).max().unwrap_or(0) + 1;
        let mut created = Self::job(next, &job.name, JobState::Waiting);
        created.description = job.description.clone();
        created.job_type = job.job_type.clone();
        created.payload = job.payload.clone();
        created.submitted_by = Some(user.to_string());
        jobs.push(created.clone());
        Ok(created)
    }

    async fn dispatch_action(&self, id: JobId, action: ActionKind, user: &ActingUser) -> Result<Job> {
        self.enter(format!("{}:{}:{}", action.segment(), id, user), "action").await?;
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.iter_mut().find(|j| j.id == id).ok_or(ApiError::NotFound {
            path: format!("/jobs/{}/{}", id, action.segment()),
        })?;
        job.state = Some(match action {
            ActionKind::Run | ActionKind::ForceRun => JobState::Running,
            ActionKind::Kill => JobState::Cancelled,
            ActionKind::Clean => JobState::Waiting,
            ActionKind::Manual => JobState::Manual,
        });
        job.last_action = Some(action.segment().to_uppercase().replace('-', "_"));
        job.last_modified_by = Some(user.to_string());
        job.last_action_time = Some("2024-05-01T10:00:00Z".to_string());
        Ok(job.clone())
    }

    async fn list_executions(&self, id: JobId) -> Result<Vec<JobExecution>> {
        self.enter(format!("list_executions:{}", id), "list_executions").await?;
        if !self.jobs.lock().unwrap().iter().any(|j| j.id == id) {
            return Err(ApiError::NotFound {
                path: format!("/jobs/{}/executions", id),
            });
        }
        Ok(self.executions.lock().unwrap().get(&id).cloned().unwrap_or_default())
    }
}
