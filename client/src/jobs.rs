use crate::api::ApiClient;
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use common::{ActingUser, ActionKind, Job, JobExecution, JobId, NewJob};

/// Typed operations exposed by the orchestrator's job endpoints.
///
/// Whether a transition is legal (e.g. killing a job that is not running) is
/// decided by the server; implementations surface whatever error comes back.
#[async_trait]
pub trait JobsApi: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn get_job(&self, id: JobId) -> Result<Job>;

    async fn register_job(&self, job: &NewJob, user: &ActingUser) -> Result<Job>;

    async fn dispatch_action(&self, id: JobId, action: ActionKind, user: &ActingUser) -> Result<Job>;

    async fn list_executions(&self, id: JobId) -> Result<Vec<JobExecution>>;

    async fn run_job(&self, id: JobId, user: &ActingUser) -> Result<Job> {
        self.dispatch_action(id, ActionKind::Run, user).await
    }

    async fn kill_job(&self, id: JobId, user: &ActingUser) -> Result<Job> {
        self.dispatch_action(id, ActionKind::Kill, user).await
    }

    async fn clean_job(&self, id: JobId, user: &ActingUser) -> Result<Job> {
        self.dispatch_action(id, ActionKind::Clean, user).await
    }

    async fn manual_job(&self, id: JobId, user: &ActingUser) -> Result<Job> {
        self.dispatch_action(id, ActionKind::Manual, user).await
    }

    async fn force_run_job(&self, id: JobId, user: &ActingUser) -> Result<Job> {
        self.dispatch_action(id, ActionKind::ForceRun, user).await
    }
}

/// Local pre-check applied before a registration request leaves the process.
pub fn validate_registration(job: &NewJob) -> Result<()> {
    if job.name.trim().is_empty() {
        return Err(ApiError::validation("Job name is required"));
    }
    Ok(())
}

pub struct HttpJobsApi {
    client: ApiClient,
}

impl HttpJobsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl JobsApi for HttpJobsApi {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        // A null body is treated as an empty list.
        let jobs: Option<Vec<Job>> = self.client.get("/jobs").await?;
        Ok(jobs.unwrap_or_default())
    }

    async fn get_job(&self, id: JobId) -> Result<Job> {
        self.client.get(&format!("/jobs/{}", id)).await
    }

    async fn register_job(&self, job: &NewJob, user: &ActingUser) -> Result<Job> {
        validate_registration(job)?;
        log::info!("Registering job '{}' as {}", job.name, user);
        self.client
            .post("/jobs", &[("user", user.as_str())], Some(job))
            .await
    }

    async fn dispatch_action(&self, id: JobId, action: ActionKind, user: &ActingUser) -> Result<Job> {
        log::info!("Dispatching {} on job {} as {}", action, id, user);
        self.client
            .post::<(), _>(
                &format!("/jobs/{}/{}", id, action.segment()),
                &[("user", user.as_str())],
                None,
            )
            .await
    }

    async fn list_executions(&self, id: JobId) -> Result<Vec<JobExecution>> {
        let executions: Option<Vec<JobExecution>> =
            self.client.get(&format!("/jobs/{}/executions", id)).await?;
        Ok(executions.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let err = validate_registration(&NewJob {
            name: "  ".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Job name is required");
    }

    #[tokio::test]
    async fn test_register_validates_before_network() {
        // Nothing listens here; a validation error proves no request was attempted.
        let api = HttpJobsApi::new(ApiClient::new("http://127.0.0.1:1").unwrap());
        let user = ActingUser::new("alice").unwrap();
        let err = api.register_job(&NewJob::default(), &user).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
