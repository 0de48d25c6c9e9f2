//! Job and task identifiers.

use std::fmt;
use std::str::FromStr;

use crate::{define_id, IdError};

define_id!(
    /// Identifies a job: a group of task instances scheduled together.
    JobId,
    "job"
);

/// Identifies one run of one instance of a job.
///
/// Every relaunch of an instance bumps `run`, so two runs of the same
/// instance never share a `TaskId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId {
    job_id: JobId,
    instance: u32,
    run: u32,
}

impl TaskId {
    /// Creates the ID for `run` of instance `instance` of `job_id`.
    #[must_use]
    pub const fn new(job_id: JobId, instance: u32, run: u32) -> Self {
        Self {
            job_id,
            instance,
            run,
        }
    }

    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    #[must_use]
    pub const fn instance(&self) -> u32 {
        self.instance
    }

    #[must_use]
    pub const fn run(&self) -> u32 {
        self.run
    }

    /// Parses `{job_id}-{instance}-{run}`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let mut parts = s.splitn(3, '-');
        let job_id = JobId::parse(parts.next().unwrap_or_default())?;
        let instance = parse_component("instance", parts.next())?;
        let run = parse_component("run", parts.next())?;

        Ok(Self::new(job_id, instance, run))
    }
}

fn parse_component(component: &'static str, value: Option<&str>) -> Result<u32, IdError> {
    let value = value.ok_or(IdError::MissingComponent(component))?;
    value.parse().map_err(|_| IdError::InvalidComponent {
        component,
        value: value.to_string(),
    })
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.job_id, self.instance, self.run)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for TaskId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for TaskId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
