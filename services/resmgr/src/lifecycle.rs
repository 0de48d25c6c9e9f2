//! Start/stop guard for background loops.
//!
//! A [`Lifecycle`] moves through `NotStarted -> Running -> Stopped` exactly
//! once. Redundant `start`/`stop` calls are no-ops, and a stopped lifecycle
//! never runs again.

use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

/// Lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    Stopped,
}

/// Idempotent start/stop guard with a shutdown signal.
#[derive(Debug)]
pub struct Lifecycle {
    state: Mutex<LifecycleState>,
    /// Cancelled by `stop`; observed by the loop.
    stop: CancellationToken,
    /// Cancelled once the loop has exited.
    done: CancellationToken,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LifecycleState::NotStarted),
            stop: CancellationToken::new(),
            done: CancellationToken::new(),
        }
    }

    /// Transition to running. Returns true only if this call did so.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != LifecycleState::NotStarted {
            return false;
        }
        *state = LifecycleState::Running;
        true
    }

    /// Transition to stopped and cancel the stop token. Returns true only
    /// if this call did so.
    ///
    /// Stopping a lifecycle that never started also completes it, since
    /// there is no loop left to report completion.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        if previous == LifecycleState::Stopped {
            return false;
        }
        *state = LifecycleState::Stopped;
        drop(state);

        self.stop.cancel();
        if previous == LifecycleState::NotStarted {
            self.done.cancel();
        }
        true
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Shutdown signal, cancelled on the first `stop`.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Called by the loop once it has exited.
    pub fn stop_complete(&self) {
        self.done.cancel();
    }

    /// Wait until the loop has reported completion.
    pub async fn wait(&self) {
        self.done.cancelled().await;
    }
}
