//! Task tracking.
//!
//! The resource manager keeps every task it has admitted in a [`Tracker`],
//! indexed by task ID and by the host the task is placed on. Components
//! that only need the host index depend on the narrower [`TaskTracker`]
//! trait so tests can substitute their own implementation.

mod tracker;

use resmgr_id::{JobId, TaskId};
use serde::{Deserialize, Serialize};

pub use tracker::Tracker;

/// Lifecycle state of a task as seen by the resource manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Admitted but not yet placed on a host.
    Pending,
    /// Assigned to a host, not yet launched.
    Placed,
    /// Launch issued to the host.
    Launched,
    Running,
    /// Queued for preemption.
    Preempting,
    Killed,
}

impl TaskState {
    /// Returns true once the task no longer holds resources on its host.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Killed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Placed => "placed",
            Self::Launched => "launched",
            Self::Running => "running",
            Self::Preempting => "preempting",
            Self::Killed => "killed",
        };
        f.write_str(s)
    }
}

/// A task tracked by the resource manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Host the task is placed on. Empty while the task is pending.
    pub hostname: String,
    pub state: TaskState,
}

impl Task {
    /// Create a running task placed on `hostname`.
    pub fn new(id: TaskId, name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hostname: hostname.into(),
            state: TaskState::Running,
        }
    }

    /// The job this task belongs to.
    pub fn job_id(&self) -> JobId {
        self.id.job_id()
    }

    /// Returns true if the task currently occupies a host.
    pub fn is_placed(&self) -> bool {
        !self.hostname.is_empty() && !self.state.is_terminal()
    }
}

/// Read access to the task-to-host index.
pub trait TaskTracker: Send + Sync {
    /// All tasks currently placed on `hostname`. Empty if there are none.
    fn tasks_by_host(&self, hostname: &str) -> Vec<Task>;
}
