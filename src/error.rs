//! Error types used by the taskgate runtime.
//!
//! This module defines three enums:
//!
//! - [`ControlError`]: rejected boundary operations (bad input, wrong state, unknown id).
//! - [`AdmissionError`]: outcome of a permit wait that did not produce a permit.
//! - [`RuntimeError`]: failures of the runtime itself (shutdown grace exceeded).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Cancellation is never an error for the caller: it is the normal termination signal.

use std::time::Duration;
use thiserror::Error;

use crate::tasks::{TaskId, TaskStatus};

/// # Errors returned by the boundary operations of the lifecycle manager.
///
/// All variants are local, recoverable and reported synchronously; none of
/// them changes state.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Malformed or out-of-range argument (e.g. a non-positive capacity).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the input.
        reason: String,
    },

    /// The task is not in the lifecycle state the operation requires.
    #[error("task {id} is {actual}, expected {expected}")]
    InvalidState {
        /// Task the operation targeted.
        id: TaskId,
        /// Status the task was found in.
        actual: TaskStatus,
        /// Human-readable description of the required state(s).
        expected: &'static str,
    },

    /// No task with this id was ever created.
    #[error("task {id} not found")]
    NotFound {
        /// Unknown id.
        id: TaskId,
    },
}

impl ControlError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::{ControlError, TaskId};
    ///
    /// let err = ControlError::NotFound { id: TaskId(4) };
    /// assert_eq!(err.as_label(), "control_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::InvalidArgument { .. } => "control_invalid_argument",
            ControlError::InvalidState { .. } => "control_invalid_state",
            ControlError::NotFound { .. } => "control_not_found",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ControlError::InvalidArgument { reason } => format!("invalid argument: {reason}"),
            ControlError::InvalidState {
                id,
                actual,
                expected,
            } => format!("task {id}: status={actual} expected={expected}"),
            ControlError::NotFound { id } => format!("task {id}: not found"),
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        ControlError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// # Outcome of an [`AdmissionGate::acquire`](crate::AdmissionGate::acquire) that yielded no permit.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// The caller's cancellation signal fired before a permit was granted.
    #[error("admission cancelled")]
    Canceled,

    /// The gate was closed (runtime shutdown).
    #[error("admission gate closed")]
    Closed,
}

impl AdmissionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmissionError::Canceled => "admission_canceled",
            AdmissionError::Closed => "admission_closed",
        }
    }
}

/// # Errors produced by the taskgate runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some tasks were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Tasks that had not terminated in time.
        stuck: Vec<TaskId>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = ControlError::InvalidState {
            id: TaskId(2),
            actual: TaskStatus::Terminated,
            expected: "Initialized",
        };
        assert_eq!(err.to_string(), "task 2 is Terminated, expected Initialized");
        assert_eq!(err.as_label(), "control_invalid_state");
    }

    #[test]
    fn test_admission_labels() {
        assert_eq!(AdmissionError::Canceled.as_label(), "admission_canceled");
        assert_eq!(AdmissionError::Closed.as_label(), "admission_closed");
    }
}
