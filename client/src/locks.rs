use common::{ActionKind, JobId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a lock covers while an action is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// Only the exact `(job, action)` pair; other actions on the job proceed.
    #[default]
    Pair,
    /// Any action on the job.
    Job,
}

/// Set of targets with an action in flight, checked before dispatch.
#[derive(Debug, Clone)]
pub struct ActionLocks {
    scope: LockScope,
    held: Arc<DashMap<JobId, Vec<ActionKind>>>,
}

impl ActionLocks {
    pub fn new(scope: LockScope) -> Self {
        Self {
            scope,
            held: Arc::new(DashMap::new()),
        }
    }

    pub fn scope(&self) -> LockScope {
        self.scope
    }

    pub fn is_locked(&self, id: JobId, action: ActionKind) -> bool {
        match self.held.get(&id) {
            Some(actions) => match self.scope {
                LockScope::Pair => actions.contains(&action),
                LockScope::Job => !actions.is_empty(),
            },
            None => false,
        }
    }

    /// Returns `None` when the target is already locked.
    pub fn try_acquire(&self, id: JobId, action: ActionKind) -> Option<ActionLockGuard> {
        let mut entry = self.held.entry(id).or_default();
        let taken = match self.scope {
            LockScope::Pair => entry.contains(&action),
            LockScope::Job => !entry.is_empty(),
        };
        if taken {
            return None;
        }
        entry.push(action);
        drop(entry);

        Some(ActionLockGuard {
            locks: self.clone(),
            id,
            action,
        })
    }

    pub fn held(&self) -> usize {
        self.held.iter().map(|e| e.value().len()).sum()
    }

    fn release(&self, id: JobId, action: ActionKind) {
        let empty = match self.held.get_mut(&id) {
            Some(mut actions) => {
                actions.retain(|a| *a != action);
                actions.is_empty()
            }
            None => false,
        };
        if empty {
            self.held.remove_if(&id, |_, actions| actions.is_empty());
        }
    }
}

impl Default for ActionLocks {
    fn default() -> Self {
        Self::new(LockScope::default())
    }
}

/// Releases its target when the action settles.
#[derive(Debug)]
pub struct ActionLockGuard {
    locks: ActionLocks,
    id: JobId,
    action: ActionKind,
}

impl Drop for ActionLockGuard {
    fn drop(&mut self) {
        self.locks.release(self.id, self.action);
    }
}
