//! Drainer errors.

use thiserror::Error;

use crate::hostmgr::HostMgrError;
use crate::preemption::PreemptionError;

/// Result type for drainer operations.
pub type DrainResult<T> = Result<T, DrainError>;

/// Errors that end a drain cycle or prevent the drainer from starting.
///
/// Every cycle error is transient from the drainer's point of view: the
/// next tick starts over from a fresh draining-host listing.
#[derive(Debug, Error)]
pub enum DrainError {
    /// Listing draining hosts failed. Nothing was touched.
    #[error("failed to list draining hosts: {0}")]
    Discovery(#[source] HostMgrError),

    /// Enqueueing a host's tasks for preemption failed.
    #[error("failed to enqueue tasks of host {host} for preemption: {source}")]
    Preemption {
        host: String,
        #[source]
        source: PreemptionError,
    },

    /// Confirming an empty host as drained failed.
    #[error("failed to mark host {host} drained: {source}")]
    DrainConfirmation {
        host: String,
        #[source]
        source: HostMgrError,
    },

    /// `start` was called outside a tokio runtime.
    #[error("drainer must be started from within a tokio runtime")]
    NoRuntime,
}

impl DrainError {
    /// The host being processed when the cycle failed, if any.
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Preemption { host, .. } | Self::DrainConfirmation { host, .. } => Some(host),
            Self::Discovery(_) | Self::NoRuntime => None,
        }
    }

    /// Short label used for the failure metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Discovery(_) => "discovery",
            Self::Preemption { .. } => "preemption",
            Self::DrainConfirmation { .. } => "drain_confirmation",
            Self::NoRuntime => "no_runtime",
        }
    }
}
