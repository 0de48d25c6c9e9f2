//! In-memory host manager for tests and local runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::info;

use super::{HostManager, HostMgrError};

/// Host manager double that serves a configurable draining list and
/// records every call made against it.
#[derive(Debug, Default)]
pub struct MockHostManager {
    draining: Mutex<Vec<String>>,
    list_error: Mutex<Option<String>>,
    mark_error: Mutex<Option<String>>,
    marked: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockHostManager {
    /// Create a host manager reporting `hosts` as draining.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::default();
        mock.set_draining(hosts);
        mock
    }

    /// Create a host manager whose draining-host listing always fails.
    pub fn failing() -> Self {
        let mock = Self::default();
        mock.fail_listing("host manager unavailable");
        mock
    }

    /// Replace the draining list.
    pub fn set_draining<I, S>(&self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.draining) = hosts.into_iter().map(Into::into).collect();
    }

    /// Fail every listing call until [`clear_failures`](Self::clear_failures).
    pub fn fail_listing(&self, message: impl Into<String>) {
        *lock(&self.list_error) = Some(message.into());
    }

    /// Fail every mark-drained call until [`clear_failures`](Self::clear_failures).
    pub fn fail_marking(&self, message: impl Into<String>) {
        *lock(&self.mark_error) = Some(message.into());
    }

    pub fn clear_failures(&self) {
        *lock(&self.list_error) = None;
        *lock(&self.mark_error) = None;
    }

    /// Number of listing calls received.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Hosts confirmed drained, in call order.
    pub fn marked_hosts(&self) -> Vec<String> {
        lock(&self.marked).clone()
    }
}

#[async_trait]
impl HostManager for MockHostManager {
    async fn get_draining_hosts(&self, limit: u32) -> Result<Vec<String>, HostMgrError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = lock(&self.list_error).clone() {
            return Err(HostMgrError::Unavailable(message));
        }

        let mut hosts = lock(&self.draining).clone();
        hosts.truncate(limit as usize);
        Ok(hosts)
    }

    async fn mark_host_drained(&self, hostname: &str) -> Result<(), HostMgrError> {
        if let Some(message) = lock(&self.mark_error).clone() {
            return Err(HostMgrError::Unavailable(message));
        }

        info!(host = %hostname, "[MOCK] Marking host drained");
        lock(&self.marked).push(hostname.to_string());
        Ok(())
    }
}
