//! Host maintenance support.
//!
//! The [`Drainer`] evacuates workload from hosts the host manager reports
//! as draining and confirms each host once it is empty. [`HostSet`] holds
//! the hosts it has issued preemption for and not yet confirmed.

mod drainer;
mod set;

pub use drainer::{
    CycleReport, Drainer, DrainerConfig, DEFAULT_DRAINER_PERIOD, DEFAULT_DRAINING_HOSTS_LIMIT,
    DEFAULT_RPC_TIMEOUT,
};
pub use set::HostSet;
