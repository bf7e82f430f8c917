//! Job kind and status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    /// Reconcile a volume with the disk.
    Index,
    /// Build a zip archive from a set of files.
    Zip,
}

impl JobKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "INDEX",
            Self::Zip => "ZIP",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a background job.
///
/// `IN_QUEUE -> RUNNING -> {DONE, ERROR, CANCELLED}`. A queued job may also
/// go straight to `CANCELLED` or `ERROR`. Terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting for the worker.
    InQueue,
    /// Currently being processed.
    Running,
    /// Successfully completed.
    Done,
    /// Failed.
    Error,
    /// Stopped on request.
    Cancelled,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (Self::InQueue, Self::Running | Self::Cancelled | Self::Error) => true,
            (Self::Running, Self::Done | Self::Error | Self::Cancelled) => true,
            _ => false,
        }
    }

    /// Return the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InQueue => "IN_QUEUE",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Error => "ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 5] = [
        JobStatus::InQueue,
        JobStatus::Running,
        JobStatus::Done,
        JobStatus::Error,
        JobStatus::Cancelled,
    ];

    #[test]
    fn test_terminal_states_are_absorbing() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(JobStatus::InQueue.can_transition_to(JobStatus::Running));
        assert!(JobStatus::InQueue.can_transition_to(JobStatus::Cancelled));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Done));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Error));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::InQueue));
        assert!(!JobStatus::InQueue.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&JobStatus::InQueue).unwrap(),
            "\"IN_QUEUE\""
        );
        assert_eq!(JobKind::Zip.to_string(), "ZIP");
    }
}
