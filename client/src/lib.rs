pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod jobs;
pub mod locks;
pub mod theme;
pub mod view;

pub use api::ApiClient;
pub use config::Config;
pub use controllers::{
    Dispatch, ExecutionsController, FormField, JobDetailController, JobsController, RegisterForm,
};
pub use error::{ApiError, ErrorCategory};
pub use jobs::{HttpJobsApi, JobsApi};
pub use locks::{ActionLocks, LockScope};
pub use view::{ViewGuard, ViewToken};

use std::sync::Arc;

/// Shared handles every screen is built from.
#[derive(Clone)]
pub struct Session {
    pub api: Arc<dyn JobsApi>,
    pub locks: ActionLocks,
    pub config: Config,
}

impl Session {
    pub fn connect(config: Config) -> error::Result<Self> {
        let client = ApiClient::new(&config.api.base_url)?;
        log::debug!("Using API at {}{}", client.base_url(), common::API_PREFIX);
        Ok(Self::with_api(Arc::new(HttpJobsApi::new(client)), config))
    }

    pub fn with_api(api: Arc<dyn JobsApi>, config: Config) -> Self {
        let locks = ActionLocks::new(config.actions.lock_scope());
        Self { api, locks, config }
    }

    pub fn jobs(&self) -> JobsController {
        JobsController::new(self.api.clone(), self.locks.clone())
    }

    pub fn job_detail(&self, id: common::JobId) -> JobDetailController {
        JobDetailController::new(self.api.clone(), self.locks.clone(), id)
    }

    /// `None` selects the configured default job.
    pub fn executions(&self, id: Option<common::JobId>) -> ExecutionsController {
        let id = id.unwrap_or(common::JobId(self.config.executions.default_job_id));
        ExecutionsController::new(self.api.clone(), id)
    }
}
