//! Per-screen state holders.
//!
//! Each controller owns a [`ViewToken`](crate::view::ViewToken) and a state
//! snapshot behind a mutex. The server is the source of truth: every mutation
//! is followed by a full re-fetch and only transient flags live here.

mod detail;
mod executions;
mod jobs_list;
mod register;

pub use detail::{JobDetailController, JobDetailState};
pub use executions::{ExecutionsController, ExecutionsState};
pub use jobs_list::{ActionMarker, JobsController, JobsViewState};
pub use register::{FormField, RegisterForm};

use crate::view::ViewToken;
use std::sync::{Arc, Mutex};

pub const FETCH_JOBS_FAILED: &str = "Failed to fetch jobs. Please try again later.";
pub const FETCH_DETAIL_FAILED: &str = "Failed to fetch job details";
pub const FETCH_EXECUTIONS_FAILED: &str = "Failed to fetch executions";

/// How an action request ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Completed,
    Failed,
    /// The target was locked; nothing was sent.
    Busy,
    /// No job is loaded on the page; nothing was sent.
    Skipped,
}

/// State cell that refuses writes once its view is torn down.
#[derive(Debug, Clone)]
struct ViewCell<S> {
    token: ViewToken,
    state: Arc<Mutex<S>>,
}

impl<S: Clone> ViewCell<S> {
    fn new(state: S) -> Self {
        Self {
            token: ViewToken::new(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn snapshot(&self) -> S {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns `false` (and drops the write) when the view is gone.
    fn commit(&self, f: impl FnOnce(&mut S)) -> bool {
        if !self.token.is_live() {
            log::debug!("View torn down, dropping late update");
            return false;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state);
        true
    }
}

#[cfg(test)]
pub(crate) mod fake;
