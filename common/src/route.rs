use crate::job::JobId;

/// Screens reachable from the command line and the interactive shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Jobs,
    JobDetail(JobId),
    Executions,
}

impl Route {
    /// `/` and the empty path redirect to `/jobs`.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Some(Route::Jobs),
            ["jobs"] => Some(Route::Jobs),
            ["jobs", id] => id.parse().ok().map(Route::JobDetail),
            ["executions"] => Some(Route::Executions),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Jobs => "/jobs".to_string(),
            Route::JobDetail(id) => format!("/jobs/{}", id),
            Route::Executions => "/executions".to_string(),
        }
    }
}
