//! Host manager collaborator.
//!
//! The host manager is the authority on host maintenance state. The
//! resource manager only asks it which hosts are draining and tells it
//! when a draining host has been emptied.

mod http;
mod mock;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpHostManager;
pub use mock::MockHostManager;

/// Host manager call errors.
#[derive(Debug, Error)]
pub enum HostMgrError {
    /// Transport-level failure.
    #[error("host manager request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The host manager answered with a non-success status.
    #[error("host manager returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The call did not complete within the configured bound.
    #[error("host manager call timed out after {0:?}")]
    Timeout(Duration),

    /// The host manager refused or could not serve the call.
    #[error("host manager unavailable: {0}")]
    Unavailable(String),
}

/// Operations the drainer needs from the host manager.
#[async_trait]
pub trait HostManager: Send + Sync {
    /// Hostnames currently in the draining state, at most `limit` of them.
    async fn get_draining_hosts(&self, limit: u32) -> Result<Vec<String>, HostMgrError>;

    /// Confirm that `hostname` has no remaining workload.
    ///
    /// Must tolerate repeated confirmation of the same host.
    async fn mark_host_drained(&self, hostname: &str) -> Result<(), HostMgrError>;
}
