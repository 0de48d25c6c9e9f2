//! # resmgr-id
//!
//! Typed identifiers for jobs and tasks tracked by the resource manager.
//!
//! ## ID Format
//!
//! Jobs use a prefixed ULID: `job_{ulid}`.
//!
//! Tasks are addressed by the job they belong to, their instance index
//! within that job and the run number of that instance:
//! `job_{ulid}-{instance}-{run}`.
//!
//! Examples:
//! - `job_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `job_01HV4Z2WQXKJNM8GPQY6VBKC3D-3-1`

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
