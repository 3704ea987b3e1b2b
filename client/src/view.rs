use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Liveness flag shared by a mounted view and its in-flight requests.
///
/// Controllers check `is_live` before committing the result of any awaited
/// call; once the view is torn down, late responses are dropped.
#[derive(Debug, Clone)]
pub struct ViewToken {
    live: Arc<AtomicBool>,
}

impl ViewToken {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn teardown(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl Default for ViewToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tears the token down when the owning view goes away.
#[derive(Debug)]
pub struct ViewGuard(ViewToken);

impl ViewGuard {
    pub fn new(token: ViewToken) -> Self {
        Self(token)
    }
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        self.0.teardown();
    }
}
