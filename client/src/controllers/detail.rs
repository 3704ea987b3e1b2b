use super::{Dispatch, ViewCell, FETCH_DETAIL_FAILED};
use crate::jobs::JobsApi;
use crate::locks::ActionLocks;
use crate::view::ViewToken;
use common::{ActingUser, ActionKind, Job, JobExecution, JobId};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct JobDetailState {
    pub job: Option<Job>,
    pub executions: Vec<JobExecution>,
    pub loading: bool,
    pub error: Option<String>,
    pub action_loading: Option<ActionKind>,
}

impl JobDetailState {
    /// Loaded, no error, and still no job: the id is unknown to the server.
    pub fn is_not_found(&self) -> bool {
        !self.loading && self.error.is_none() && self.job.is_none()
    }
}

/// Detail screen for one job, keyed by the route's id.
#[derive(Clone)]
pub struct JobDetailController {
    api: Arc<dyn JobsApi>,
    locks: ActionLocks,
    id: JobId,
    cell: ViewCell<JobDetailState>,
}

impl JobDetailController {
    pub fn new(api: Arc<dyn JobsApi>, locks: ActionLocks, id: JobId) -> Self {
        Self {
            api,
            locks,
            id,
            cell: ViewCell::new(JobDetailState::default()),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn token(&self) -> ViewToken {
        self.cell.token.clone()
    }

    pub fn snapshot(&self) -> JobDetailState {
        self.cell.snapshot()
    }

    pub async fn mount(&self) {
        self.refresh().await;
    }

    /// Fetches the job and its executions concurrently; commits both or neither.
    pub async fn refresh(&self) -> bool {
        if !self.cell.commit(|s| {
            s.loading = true;
            s.error = None;
        }) {
            return false;
        }

        let result = tokio::try_join!(self.api.get_job(self.id), self.api.list_executions(self.id));
        let ok = result.is_ok();
        let id = self.id;

        self.cell.commit(|s| {
            s.loading = false;
            match result {
                Ok((job, executions)) => {
                    s.job = Some(job);
                    s.executions = executions;
                }
                Err(e) if e.is_not_found() => {
                    log::info!("Job {} not found", id);
                    s.job = None;
                    s.executions.clear();
                }
                Err(e) => {
                    log::warn!("Error fetching job {}: {}", id, e);
                    s.job = None;
                    s.executions.clear();
                    s.error = Some(FETCH_DETAIL_FAILED.to_string());
                }
            }
        });
        ok
    }

    pub async fn dispatch(&self, action: ActionKind, user: &ActingUser) -> Dispatch {
        let Some(id) = self.snapshot().job.map(|j| j.id) else {
            return Dispatch::Skipped;
        };
        let Some(_lock) = self.locks.try_acquire(id, action) else {
            log::debug!("{} on job {} already in flight", action, id);
            return Dispatch::Busy;
        };

        self.cell.commit(|s| {
            s.action_loading = Some(action);
            s.error = None;
        });

        let outcome = match self.api.dispatch_action(id, action, user).await {
            Ok(_) => Dispatch::Completed,
            Err(e) => {
                log::warn!("{} on job {} failed: {}", action, id, e);
                Dispatch::Failed
            }
        };

        self.refresh().await;

        self.cell.commit(|s| {
            if outcome == Dispatch::Failed {
                s.error = Some(action.failure_message());
            }
            if s.action_loading == Some(action) {
                s.action_loading = None;
            }
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fake::FakeJobsApi;
    use common::JobState;

    fn detail(fake: &Arc<FakeJobsApi>, id: i64) -> JobDetailController {
        JobDetailController::new(fake.clone(), ActionLocks::default(), JobId(id))
    }

    fn seeded() -> Arc<FakeJobsApi> {
        let fake = FakeJobsApi::with_jobs(vec![FakeJobsApi::job(1, "nightly-etl", JobState::Waiting)]);
        fake.set_executions(
            JobId(1),
            vec![FakeJobsApi::execution(10, "SUCCESS"), FakeJobsApi::execution(11, "mystery")],
        );
        Arc::new(fake)
    }

    #[tokio::test]
    async fn test_mount_loads_job_and_executions() {
        let fake = seeded();
        let page = detail(&fake, 1);
        page.mount().await;

        let state = page.snapshot();
        assert_eq!(state.job.as_ref().map(|j| j.name.as_str()), Some("nightly-etl"));
        assert_eq!(state.executions.len(), 2);
        assert!(!state.loading);
        assert_eq!(fake.count("get_job:1"), 1);
        assert_eq!(fake.count("list_executions:1"), 1);
    }

    #[tokio::test]
    async fn test_executions_failure_hides_job() {
        let fake = seeded();
        fake.fail_executions(500);
        let page = detail(&fake, 1);
        page.mount().await;

        let state = page.snapshot();
        assert!(state.job.is_none());
        assert!(state.executions.is_empty());
        assert_eq!(state.error.as_deref(), Some(FETCH_DETAIL_FAILED));
    }

    #[tokio::test]
    async fn test_failed_refresh_drops_loaded_job() {
        let fake = seeded();
        let page = detail(&fake, 1);
        page.mount().await;
        assert!(page.snapshot().job.is_some());

        fake.fail_executions(500);
        assert!(!page.refresh().await);

        let state = page.snapshot();
        assert!(state.job.is_none());
        assert!(state.executions.is_empty());
        assert_eq!(state.error.as_deref(), Some(FETCH_DETAIL_FAILED));
    }

    #[tokio::test]
    async fn test_job_failure_hides_executions() {
        let fake = seeded();
        fake.fail_get(503);
        let page = detail(&fake, 1);
        page.mount().await;

        let state = page.snapshot();
        assert!(state.job.is_none());
        assert!(state.executions.is_empty());
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_not_error() {
        let fake = seeded();
        let page = detail(&fake, 99);
        page.mount().await;

        let state = page.snapshot();
        assert!(state.is_not_found());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_without_job_is_skipped() {
        let fake = seeded();
        let page = detail(&fake, 99);
        page.mount().await;

        let user = ActingUser::new("alice").unwrap();
        assert_eq!(page.dispatch(ActionKind::Run, &user).await, Dispatch::Skipped);
        assert_eq!(fake.count("run:99:alice"), 0);
    }

    #[tokio::test]
    async fn test_force_run_refetches_both() {
        let fake = seeded();
        let page = detail(&fake, 1);
        page.mount().await;

        let user = ActingUser::new("alice").unwrap();
        assert_eq!(page.dispatch(ActionKind::ForceRun, &user).await, Dispatch::Completed);

        let state = page.snapshot();
        assert!(state.action_loading.is_none());
        assert_eq!(state.job.as_ref().and_then(|j| j.state), Some(JobState::Running));
        assert_eq!(state.job.as_ref().and_then(|j| j.last_action.clone()).as_deref(), Some("FORCE_RUN"));
        assert_eq!(fake.count("get_job:1"), 2);
        assert_eq!(fake.count("list_executions:1"), 2);
    }

    #[tokio::test]
    async fn test_failed_manual_reports_and_settles() {
        let fake = seeded();
        let page = detail(&fake, 1);
        page.mount().await;
        fake.fail_actions(409);

        let user = ActingUser::new("bob").unwrap();
        assert_eq!(page.dispatch(ActionKind::Manual, &user).await, Dispatch::Failed);

        let state = page.snapshot();
        assert!(state.action_loading.is_none());
        assert_eq!(state.error.as_deref(), Some("Failed to manual job"));

        fake.clear_failures();
        page.refresh().await;
        assert!(page.snapshot().error.is_none());
    }
}
