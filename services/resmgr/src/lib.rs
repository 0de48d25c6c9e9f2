//! Resource manager library.
//!
//! The resource manager tracks admitted tasks and the hosts they run on.
//! This crate carries its host maintenance path: when the host manager
//! puts a host into draining, the [`Drainer`](host::Drainer) preempts the
//! tasks still placed there and confirms the host once it is empty.
//!
//! ## Architecture
//!
//! ```text
//! Drainer (periodic loop)
//! ├── HostManager       (draining hosts, drain confirmation)
//! ├── TaskTracker       (tasks by host)
//! └── PreemptionQueue   (tasks to evict)
//! ```
//!
//! ## Modules
//!
//! - `host`: Drainer and the pending-drain host set
//! - `hostmgr`: Host manager client trait, HTTP client and mock
//! - `task`: Task model and in-memory tracker
//! - `preemption`: Preemption queue trait and in-memory queue
//! - `lifecycle`: Idempotent start/stop guard

pub mod config;
pub mod error;
pub mod host;
pub mod hostmgr;
pub mod lifecycle;
pub mod metrics;
pub mod preemption;
pub mod task;

pub use error::{DrainError, DrainResult};
pub use host::{Drainer, DrainerConfig};
pub use hostmgr::MockHostManager;
pub use preemption::MockPreemptionQueue;
