//! In-memory FIFO preemption queue.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use resmgr_id::TaskId;
use tokio::sync::Notify;
use tracing::{debug, info};

use super::{PreemptionError, PreemptionQueue, PreemptionReason};
use crate::task::{Task, TaskState, Tracker};

/// A task waiting to be preempted.
#[derive(Debug, Clone)]
pub struct PreemptionCandidate {
    pub task: Task,
    pub reason: PreemptionReason,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    candidates: VecDeque<PreemptionCandidate>,
    queued: HashSet<TaskId>,
    closed: bool,
}

/// FIFO of preemption candidates, deduplicated by task ID.
///
/// A task stays deduplicated until it is dequeued, so re-submitting the
/// same host's tasks on every drain cycle does not grow the queue.
#[derive(Debug, Default)]
pub struct TaskQueue {
    state: Mutex<State>,
    notify: Notify,
    tracker: Option<Arc<Tracker>>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that marks newly enqueued tasks as preempting in `tracker`.
    pub fn with_tracker(tracker: Arc<Tracker>) -> Self {
        Self {
            tracker: Some(tracker),
            ..Self::default()
        }
    }

    /// Pop the oldest candidate, waiting up to `timeout` for one to arrive.
    pub async fn dequeue(&self, timeout: Duration) -> Result<PreemptionCandidate, PreemptionError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(candidate) = state.candidates.pop_front() {
                    state.queued.remove(&candidate.task.id);
                    return Ok(candidate);
                }
                if state.closed {
                    return Err(PreemptionError::Closed);
                }
            }

            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return Err(PreemptionError::Timeout(timeout));
            }
        }
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject further enqueues. Queued candidates can still be dequeued.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
        info!("Preemption queue closed");
    }

    pub fn is_closed(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed
    }
}

#[async_trait]
impl PreemptionQueue for TaskQueue {
    async fn enqueue_tasks(
        &self,
        tasks: Vec<Task>,
        reason: PreemptionReason,
    ) -> Result<(), PreemptionError> {
        if tasks.is_empty() {
            return Err(PreemptionError::EmptyBatch);
        }

        let mut added = Vec::new();
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.closed {
                return Err(PreemptionError::Closed);
            }

            let now = Utc::now();
            for task in tasks {
                if !state.queued.insert(task.id) {
                    continue;
                }
                added.push(task.id);
                state.candidates.push_back(PreemptionCandidate {
                    task,
                    reason,
                    enqueued_at: now,
                });
            }
        }

        if let Some(tracker) = &self.tracker {
            for id in &added {
                tracker.set_state(id, TaskState::Preempting);
            }
        }

        debug!(added = added.len(), reason = %reason, "Enqueued tasks for preemption");
        if !added.is_empty() {
            self.notify.notify_one();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskTracker;
    use resmgr_id::JobId;

    fn task(host: &str) -> Task {
        Task::new(TaskId::new(JobId::new(), 0, 1), "web", host)
    }

    #[tokio::test]
    async fn test_enqueue_then_dequeue_fifo() {
        let queue = TaskQueue::new();
        let a = task("host-a");
        let b = task("host-a");
        queue
            .enqueue_tasks(vec![a.clone(), b.clone()], PreemptionReason::HostMaintenance)
            .await
            .unwrap();

        let first = queue.dequeue(Duration::from_millis(10)).await.unwrap();
        let second = queue.dequeue(Duration::from_millis(10)).await.unwrap();
        assert_eq!(first.task.id, a.id);
        assert_eq!(second.task.id, b.id);
        assert_eq!(first.reason, PreemptionReason::HostMaintenance);
    }

    #[tokio::test]
    async fn test_enqueue_dedupes_queued_tasks() {
        let queue = TaskQueue::new();
        let a = task("host-a");
        for _ in 0..3 {
            queue
                .enqueue_tasks(vec![a.clone()], PreemptionReason::HostMaintenance)
                .await
                .unwrap();
        }
        assert_eq!(queue.len(), 1);

        queue.dequeue(Duration::from_millis(10)).await.unwrap();
        queue
            .enqueue_tasks(vec![a], PreemptionReason::HostMaintenance)
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let queue = TaskQueue::new();
        let result = queue
            .enqueue_tasks(vec![], PreemptionReason::HostMaintenance)
            .await;
        assert!(matches!(result, Err(PreemptionError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_enqueue() {
        let queue = TaskQueue::new();
        queue.close();
        assert!(queue.is_closed());

        let result = queue
            .enqueue_tasks(vec![task("host-a")], PreemptionReason::HostMaintenance)
            .await;
        assert!(matches!(result, Err(PreemptionError::Closed)));
        assert!(matches!(
            queue.dequeue(Duration::from_millis(10)).await,
            Err(PreemptionError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dequeue_times_out() {
        let queue = TaskQueue::new();
        let result = queue.dequeue(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(PreemptionError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_dequeue_wakes_on_enqueue() {
        let queue = Arc::new(TaskQueue::new());
        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.dequeue(Duration::from_secs(5)).await }
        });

        tokio::task::yield_now().await;
        let t = task("host-a");
        queue
            .enqueue_tasks(vec![t.clone()], PreemptionReason::HostMaintenance)
            .await
            .unwrap();

        let candidate = waiter.await.unwrap().unwrap();
        assert_eq!(candidate.task.id, t.id);
    }

    #[tokio::test]
    async fn test_tracker_marks_preempting() {
        let tracker = Arc::new(Tracker::new());
        let t = task("host-a");
        tracker.add_task(t.clone());

        let queue = TaskQueue::with_tracker(Arc::clone(&tracker));
        queue
            .enqueue_tasks(tracker.tasks_by_host("host-a"), PreemptionReason::HostMaintenance)
            .await
            .unwrap();

        assert_eq!(tracker.get_task(&t.id).unwrap().state, TaskState::Preempting);
        // Preempting tasks still occupy the host until killed.
        assert_eq!(tracker.tasks_by_host("host-a").len(), 1);
    }
}
