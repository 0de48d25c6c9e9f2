//! Recording preemption queue for tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::info;

use super::{PreemptionError, PreemptionQueue, PreemptionReason};
use crate::task::Task;

/// Preemption queue double that records every enqueue call as one batch.
#[derive(Debug, Default)]
pub struct MockPreemptionQueue {
    batches: Mutex<Vec<(Vec<Task>, PreemptionReason)>>,
    enqueue_error: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPreemptionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that rejects every batch.
    pub fn failing() -> Self {
        let mock = Self::default();
        mock.fail_enqueue("preemption queue unavailable");
        mock
    }

    /// Fail every enqueue call until [`clear_failures`](Self::clear_failures).
    pub fn fail_enqueue(&self, message: impl Into<String>) {
        *lock(&self.enqueue_error) = Some(message.into());
    }

    pub fn clear_failures(&self) {
        *lock(&self.enqueue_error) = None;
    }

    /// Accepted batches, in call order.
    pub fn batches(&self) -> Vec<(Vec<Task>, PreemptionReason)> {
        lock(&self.batches).clone()
    }

    /// Number of accepted enqueue calls.
    pub fn enqueue_calls(&self) -> usize {
        lock(&self.batches).len()
    }
}

#[async_trait]
impl PreemptionQueue for MockPreemptionQueue {
    async fn enqueue_tasks(
        &self,
        tasks: Vec<Task>,
        reason: PreemptionReason,
    ) -> Result<(), PreemptionError> {
        if let Some(message) = lock(&self.enqueue_error).clone() {
            return Err(PreemptionError::Unavailable(message));
        }

        info!(task_count = tasks.len(), %reason, "[MOCK] Enqueueing tasks");
        lock(&self.batches).push((tasks, reason));
        Ok(())
    }
}
