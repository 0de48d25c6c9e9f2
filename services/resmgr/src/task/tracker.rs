//! In-memory task tracker.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use resmgr_id::TaskId;
use tracing::debug;

use super::{Task, TaskState, TaskTracker};

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<TaskId, Task>,
    by_host: HashMap<String, BTreeSet<TaskId>>,
}

impl Inner {
    fn index(&mut self, task: &Task) {
        if task.is_placed() {
            self.by_host
                .entry(task.hostname.clone())
                .or_default()
                .insert(task.id);
        }
    }

    fn unindex(&mut self, task: &Task) {
        if let Some(ids) = self.by_host.get_mut(&task.hostname) {
            ids.remove(&task.id);
            if ids.is_empty() {
                self.by_host.remove(&task.hostname);
            }
        }
    }
}

/// Tracks admitted tasks by ID and by host.
///
/// Constructed explicitly and shared through an `Arc`; there is no
/// process-wide instance.
#[derive(Debug, Default)]
pub struct Tracker {
    inner: RwLock<Inner>,
}

impl Tracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a task.
    pub fn add_task(&self, task: Task) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = inner.tasks.remove(&task.id) {
            inner.unindex(&old);
        }
        debug!(task_id = %task.id, host = %task.hostname, "Tracking task");
        inner.index(&task);
        inner.tasks.insert(task.id, task);
    }

    /// Stop tracking a task. Returns the removed task, if any.
    pub fn remove_task(&self, id: &TaskId) -> Option<Task> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let task = inner.tasks.remove(id)?;
        inner.unindex(&task);
        Some(task)
    }

    /// Set the state of a task. Returns false if the task is unknown.
    pub fn set_state(&self, id: &TaskId, state: TaskState) -> bool {
        self.update(id, |task| task.state = state)
    }

    fn update(&self, id: &TaskId, f: impl FnOnce(&mut Task)) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(mut task) = inner.tasks.remove(id) else {
            return false;
        };
        inner.unindex(&task);
        f(&mut task);
        inner.index(&task);
        inner.tasks.insert(task.id, task);
        true
    }

    pub fn get_task(&self, id: &TaskId) -> Option<Task> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.tasks.get(id).cloned()
    }

    /// Number of tracked tasks.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every tracked task.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.tasks.clear();
        inner.by_host.clear();
    }
}

impl TaskTracker for Tracker {
    fn tasks_by_host(&self, hostname: &str) -> Vec<Task> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .by_host
            .get(hostname)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect()
    }
}
