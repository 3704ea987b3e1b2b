use super::{ViewCell, FETCH_EXECUTIONS_FAILED};
use crate::jobs::JobsApi;
use crate::view::ViewToken;
use common::{JobExecution, JobId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ExecutionsState {
    pub job_id: JobId,
    pub executions: Vec<JobExecution>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Read-only execution history for the selected job.
#[derive(Clone)]
pub struct ExecutionsController {
    api: Arc<dyn JobsApi>,
    cell: ViewCell<ExecutionsState>,
    /// Bumped by every fetch; only the newest may commit.
    generation: Arc<AtomicU64>,
}

impl ExecutionsController {
    pub fn new(api: Arc<dyn JobsApi>, job_id: JobId) -> Self {
        Self {
            api,
            cell: ViewCell::new(ExecutionsState {
                job_id,
                executions: Vec::new(),
                loading: false,
                error: None,
            }),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn token(&self) -> ViewToken {
        self.cell.token.clone()
    }

    pub fn snapshot(&self) -> ExecutionsState {
        self.cell.snapshot()
    }

    pub async fn mount(&self) {
        self.refresh().await;
    }

    pub async fn select(&self, job_id: JobId) {
        if self.cell.commit(|s| {
            s.job_id = job_id;
            s.executions.clear();
        }) {
            self.refresh().await;
        }
    }

    pub async fn refresh(&self) -> bool {
        let mut job_id = JobId(0);
        let mut generation = 0;
        if !self.cell.commit(|s| {
            s.loading = true;
            s.error = None;
            job_id = s.job_id;
            generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        }) {
            return false;
        }

        let result = self.api.list_executions(job_id).await;
        let ok = result.is_ok();

        self.cell.commit(|s| {
            // A newer fetch owns the list now.
            if self.generation.load(Ordering::Acquire) != generation {
                log::debug!("Dropping superseded executions for job {}", job_id);
                return;
            }
            s.loading = false;
            match result {
                Ok(executions) => s.executions = executions,
                Err(e) => {
                    log::warn!("Error fetching executions for job {}: {}", job_id, e);
                    s.error = Some(FETCH_EXECUTIONS_FAILED.to_string());
                }
            }
        });
        ok
    }
}
