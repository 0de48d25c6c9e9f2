//! Concurrent set of hostnames.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Thread-safe set of hostnames.
///
/// Every read takes the lock for its whole duration, so [`to_vec`](Self::to_vec)
/// is a consistent snapshot even while another thread is writing.
#[derive(Debug, Default)]
pub struct HostSet {
    hosts: RwLock<HashSet<String>>,
}

impl HostSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host. Returns false if it was already present.
    pub fn add(&self, host: impl Into<String>) -> bool {
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host.into())
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(host)
    }

    /// Remove a host. Returns false if it was not present.
    pub fn remove(&self, host: &str) -> bool {
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(host)
    }

    pub fn clear(&self) {
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Keep only the hosts for which `keep` returns true. Returns the
    /// removed hosts.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut hosts = self.hosts.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = Vec::new();
        hosts.retain(|host| {
            let kept = keep(host.as_str());
            if !kept {
                removed.push(host.clone());
            }
            kept
        });
        removed
    }

    /// Snapshot of the current members, in no particular order.
    pub fn to_vec(&self) -> Vec<String> {
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hosts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
