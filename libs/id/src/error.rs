//! Error types for ID parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The ID has an invalid prefix.
    #[error("invalid ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ID is missing the underscore separator.
    #[error("ID missing underscore separator")]
    MissingSeparator,

    /// The ULID portion of the ID is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),

    /// A task ID is missing its instance or run component.
    #[error("task ID missing component: {0}")]
    MissingComponent(&'static str),

    /// A numeric task ID component did not parse.
    #[error("invalid task ID {component}: '{value}'")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if the job portion parsed but the task suffix did not.
    pub fn is_task_suffix_error(&self) -> bool {
        matches!(
            self,
            IdError::MissingComponent(_) | IdError::InvalidComponent { .. }
        )
    }
}
