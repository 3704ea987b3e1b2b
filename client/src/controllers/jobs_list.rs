use super::{Dispatch, ViewCell, FETCH_JOBS_FAILED};
use crate::error::Result;
use crate::jobs::JobsApi;
use crate::locks::ActionLocks;
use crate::view::ViewToken;
use common::{ActingUser, ActionKind, Job, JobId, NewJob};
use std::sync::Arc;

/// The row action currently shown as busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMarker {
    pub id: JobId,
    pub action: ActionKind,
}

#[derive(Debug, Clone)]
pub struct JobsViewState {
    pub jobs: Vec<Job>,
    pub loading: bool,
    pub error: Option<String>,
    pub action_loading: Option<ActionMarker>,
    pub register_open: bool,
    pub register_loading: bool,
}

impl Default for JobsViewState {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            loading: true,
            error: None,
            action_loading: None,
            register_open: false,
            register_loading: false,
        }
    }
}

impl JobsViewState {
    pub fn is_action_busy(&self, id: JobId, action: ActionKind) -> bool {
        self.action_loading == Some(ActionMarker { id, action })
    }
}

/// Jobs list screen.
#[derive(Clone)]
pub struct JobsController {
    api: Arc<dyn JobsApi>,
    locks: ActionLocks,
    cell: ViewCell<JobsViewState>,
}

impl JobsController {
    pub fn new(api: Arc<dyn JobsApi>, locks: ActionLocks) -> Self {
        Self {
            api,
            locks,
            cell: ViewCell::new(JobsViewState::default()),
        }
    }

    pub fn token(&self) -> ViewToken {
        self.cell.token.clone()
    }

    pub fn snapshot(&self) -> JobsViewState {
        self.cell.snapshot()
    }

    pub fn is_action_busy(&self, id: JobId, action: ActionKind) -> bool {
        self.snapshot().is_action_busy(id, action) || self.locks.is_locked(id, action)
    }

    pub async fn mount(&self) {
        self.refresh().await;
    }

    /// Replaces the whole collection; returns whether the fetch succeeded.
    pub async fn refresh(&self) -> bool {
        if !self.cell.commit(|s| {
            s.loading = true;
            s.error = None;
        }) {
            return false;
        }

        let result = self.api.list_jobs().await;
        let ok = result.is_ok();

        self.cell.commit(|s| {
            s.loading = false;
            match result {
                Ok(jobs) => {
                    log::debug!("Fetched {} jobs", jobs.len());
                    s.jobs = jobs;
                }
                Err(e) => {
                    log::warn!("Error fetching jobs: {}", e);
                    s.error = Some(FETCH_JOBS_FAILED.to_string());
                }
            }
        });
        ok
    }

    pub async fn dispatch(&self, id: JobId, action: ActionKind, user: &ActingUser) -> Dispatch {
        let Some(_lock) = self.locks.try_acquire(id, action) else {
            log::debug!("{} on job {} already in flight", action, id);
            return Dispatch::Busy;
        };

        let marker = ActionMarker { id, action };
        self.cell.commit(|s| {
            s.action_loading = Some(marker);
            s.error = None;
        });

        let outcome = match self.api.dispatch_action(id, action, user).await {
            Ok(job) => {
                log::info!("{} on job {} accepted, state now {:?}", action, id, job.state);
                Dispatch::Completed
            }
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
            if s.action_loading == Some(marker) {
                s.action_loading = None;
            }
        });
        outcome
    }

    pub fn open_register(&self) {
        self.cell.commit(|s| s.register_open = true);
    }

    pub fn close_register(&self) {
        self.cell.commit(|s| s.register_open = false);
    }

    /// Registers, refreshes the list and closes the dialog. Errors go back to
    /// the form so it can keep its fields for correction.
    pub async fn register(&self, job: &NewJob, user: &ActingUser) -> Result<Job> {
        self.cell.commit(|s| s.register_loading = true);

        let result = self.api.register_job(job, user).await;
        if let Ok(created) = &result {
            log::info!("Registered job {} ({})", created.id, created.name);
            self.refresh().await;
            self.cell.commit(|s| s.register_open = false);
        }

        self.cell.commit(|s| s.register_loading = false);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fake::FakeJobsApi;
    use crate::locks::LockScope;
    use common::JobState;

    fn alice() -> ActingUser {
        ActingUser::new("alice").unwrap()
    }

    fn controller(fake: &Arc<FakeJobsApi>) -> JobsController {
        JobsController::new(fake.clone(), ActionLocks::default())
    }

    #[tokio::test]
    async fn test_mount_replaces_jobs() {
        let fake = Arc::new(FakeJobsApi::with_jobs(vec![FakeJobsApi::job(1, "nightly-etl", JobState::Waiting)]));
        let jobs = controller(&fake);
        assert!(jobs.snapshot().loading);

        jobs.mount().await;

        let state = jobs.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.jobs.len(), 1);
        assert_eq!(state.jobs[0].state, Some(JobState::Waiting));
        for action in ActionKind::ROW_ACTIONS {
            assert!(!jobs.is_action_busy(JobId(1), action));
        }
    }

    #[tokio::test]
    async fn test_list_twice_hits_server_twice() {
        let fake = Arc::new(FakeJobsApi::with_jobs(vec![FakeJobsApi::job(1, "a", JobState::Waiting)]));
        let jobs = controller(&fake);
        jobs.refresh().await;
        let first = jobs.snapshot().jobs;
        jobs.refresh().await;
        let second = jobs.snapshot().jobs;

        assert_eq!(first, second);
        assert_eq!(fake.count("list_jobs"), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_sets_message() {
        let fake = Arc::new(FakeJobsApi::default());
        fake.fail_list(500);
        let jobs = controller(&fake);
        jobs.mount().await;

        let state = jobs.snapshot();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some(FETCH_JOBS_FAILED));
    }

    #[tokio::test]
    async fn test_run_refetches_server_state() {
        let fake = Arc::new(FakeJobsApi::with_jobs(vec![FakeJobsApi::job(1, "nightly-etl", JobState::Waiting)]));
        let jobs = controller(&fake);
        jobs.mount().await;

        let outcome = jobs.dispatch(JobId(1), ActionKind::Run, &alice()).await;
        assert_eq!(outcome, Dispatch::Completed);

        let state = jobs.snapshot();
        assert!(state.action_loading.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.jobs[0].state, Some(JobState::Running));
        assert_eq!(state.jobs[0].last_action.as_deref(), Some("RUN"));
        assert_eq!(state.jobs[0].last_modified_by.as_deref(), Some("alice"));
        assert_eq!(fake.count("list_jobs"), 2);
        assert_eq!(fake.count("run:1:alice"), 1);
    }

    #[tokio::test]
    async fn test_failed_action_clears_marker_and_keeps_message() {
        let fake = Arc::new(FakeJobsApi::with_jobs(vec![FakeJobsApi::job(1, "a", JobState::Waiting)]));
        fake.fail_actions(409);
        let jobs = controller(&fake);
        jobs.mount().await;

        let outcome = jobs.dispatch(JobId(1), ActionKind::Kill, &alice()).await;
        assert_eq!(outcome, Dispatch::Failed);

        let state = jobs.snapshot();
        assert!(state.action_loading.is_none());
        assert_eq!(state.error.as_deref(), Some("Failed to kill job"));
        assert_eq!(state.jobs[0].state, Some(JobState::Waiting));
        assert_eq!(fake.count("list_jobs"), 2);
    }

    #[tokio::test]
    async fn test_locked_pair_is_busy_without_request() {
        let fake = Arc::new(FakeJobsApi::with_jobs(vec![FakeJobsApi::job(1, "a", JobState::Waiting)]));
        let locks = ActionLocks::new(LockScope::Pair);
        let jobs = JobsController::new(fake.clone(), locks.clone());

        let _held = locks.try_acquire(JobId(1), ActionKind::Run).unwrap();
        assert!(jobs.is_action_busy(JobId(1), ActionKind::Run));
        assert_eq!(jobs.dispatch(JobId(1), ActionKind::Run, &alice()).await, Dispatch::Busy);
        assert_eq!(fake.count("run:1:alice"), 0);

        assert_eq!(jobs.dispatch(JobId(1), ActionKind::Clean, &alice()).await, Dispatch::Completed);
    }

    #[tokio::test]
    async fn test_late_response_after_teardown_is_dropped() {
        let fake = Arc::new(FakeJobsApi::with_jobs(vec![FakeJobsApi::job(1, "a", JobState::Waiting)]));
        let jobs = controller(&fake);

        let gate = fake.hold().await;
        let task = {
            let jobs = jobs.clone();
            tokio::spawn(async move { jobs.refresh().await })
        };
        fake.wait_for_call("list_jobs").await;

        jobs.token().teardown();
        drop(gate);
        task.await.unwrap();

        let state = jobs.snapshot();
        assert!(state.jobs.is_empty());
        assert!(state.loading);
    }

    #[tokio::test]
    async fn test_newer_marker_survives_older_action_settling() {
        let fake = Arc::new(FakeJobsApi::with_jobs(vec![
            FakeJobsApi::job(1, "a", JobState::Waiting),
            FakeJobsApi::job(2, "b", JobState::Running),
        ]));
        let locks = ActionLocks::default();
        let jobs = JobsController::new(fake.clone(), locks.clone());
        jobs.mount().await;

        let gate = fake.hold().await;
        let run = {
            let jobs = jobs.clone();
            tokio::spawn(async move { jobs.dispatch(JobId(1), ActionKind::Run, &alice()).await })
        };
        fake.wait_for_call("run:1:alice").await;
        let kill = {
            let jobs = jobs.clone();
            tokio::spawn(async move { jobs.dispatch(JobId(2), ActionKind::Kill, &alice()).await })
        };
        fake.wait_for_call("kill:2:alice").await;

        assert_eq!(
            jobs.snapshot().action_loading,
            Some(ActionMarker { id: JobId(2), action: ActionKind::Kill })
        );
        assert_eq!(locks.held(), 2);

        drop(gate);
        assert_eq!(run.await.unwrap(), Dispatch::Completed);
        assert_eq!(kill.await.unwrap(), Dispatch::Completed);

        let state = jobs.snapshot();
        assert!(state.action_loading.is_none());
        assert_eq!(locks.held(), 0);
    }

    #[tokio::test]
    async fn test_register_closes_dialog_and_refreshes() {
        let fake = Arc::new(FakeJobsApi::default());
        let jobs = controller(&fake);
        jobs.mount().await;
        jobs.open_register();

        let created = jobs
            .register(&NewJob { name: "backup".into(), ..Default::default() }, &alice())
            .await
            .unwrap();
        assert_eq!(created.name, "backup");

        let state = jobs.snapshot();
        assert!(!state.register_open);
        assert!(!state.register_loading);
        assert_eq!(state.jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_register_failure_keeps_dialog_open() {
        let fake = Arc::new(FakeJobsApi::default());
        fake.fail_register(400);
        let jobs = controller(&fake);
        jobs.open_register();

        let err = jobs
            .register(&NewJob { name: "backup".into(), ..Default::default() }, &alice())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));

        let state = jobs.snapshot();
        assert!(state.register_open);
        assert!(!state.register_loading);
    }
}
