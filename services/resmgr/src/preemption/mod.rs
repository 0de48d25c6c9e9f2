//! Preemption of running tasks.
//!
//! Components that want tasks evicted submit them to a [`PreemptionQueue`].
//! Draining a host is one such reason; the consumer side of the queue
//! decides when and how each candidate is actually stopped.

mod mock;
mod queue;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::Task;

pub use mock::MockPreemptionQueue;
pub use queue::{PreemptionCandidate, TaskQueue};

/// Why a task is being preempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreemptionReason {
    /// The task's host is being drained for maintenance.
    HostMaintenance,
}

impl std::fmt::Display for PreemptionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HostMaintenance => f.write_str("host_maintenance"),
        }
    }
}

/// Preemption queue errors.
#[derive(Debug, Error)]
pub enum PreemptionError {
    /// An enqueue call carried no tasks.
    #[error("no tasks to enqueue")]
    EmptyBatch,

    /// The queue has been closed.
    #[error("preemption queue is closed")]
    Closed,

    /// The call did not complete before the deadline.
    #[error("preemption queue timed out after {0:?}")]
    Timeout(Duration),

    /// A remote queue failed to accept the batch.
    #[error("preemption queue unavailable: {0}")]
    Unavailable(String),
}

/// Write side of the preemption queue.
#[async_trait]
pub trait PreemptionQueue: Send + Sync {
    /// Submit `tasks` for preemption as one batch.
    async fn enqueue_tasks(
        &self,
        tasks: Vec<Task>,
        reason: PreemptionReason,
    ) -> Result<(), PreemptionError>;
}
