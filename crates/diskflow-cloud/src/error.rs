//! Cloud lifecycle error types

use crate::compensator::Step;
use crate::model::ResourceKind;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// The adapter call itself failed (network, malformed request, provider API error)
    #[error("Provider call failed: {0}")]
    Transport(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A describe call returned more than one record for a unique identifier
    #[error("{count} {kind}s found for id {id}")]
    Ambiguous {
        kind: ResourceKind,
        id: String,
        count: usize,
    },

    /// The provider reports the resource itself reached a failure state
    #[error("{kind} {id} reached failure state '{status}'")]
    TerminalFailure {
        kind: ResourceKind,
        id: String,
        status: String,
    },

    #[error("Timeout: {description} (gave up after {elapsed:?}, {attempts} checks)")]
    Timeout {
        description: String,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("Cancelled: {description}")]
    Cancelled { description: String },

    /// The action was accepted but a required side effect is missing
    #[error("Inconsistent provider state: {0}")]
    Inconsistency(String),

    #[error("{kind} {id} still exists after deletion")]
    StillPresent { kind: ResourceKind, id: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CloudError {
    /// Whether this is a bounded-wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, CloudError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// Failure of one orchestrator operation.
///
/// Carries the original error together with the steps the operation had
/// completed when it failed and whatever went wrong while undoing them.
/// Only the original error is exposed through `Display` and `source`.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct OperationFailure {
    #[source]
    pub error: CloudError,

    /// Steps completed before the failure, in completion order
    pub completed: Vec<Step>,

    /// Errors raised while compensating; never replace `error`
    pub compensation_errors: Vec<CloudError>,
}

impl OperationFailure {
    /// A failure that happened before anything needed undoing
    pub fn bare(error: CloudError) -> Self {
        Self {
            error,
            completed: Vec::new(),
            compensation_errors: Vec::new(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.error.is_timeout()
    }

    /// Whether every compensating action succeeded
    pub fn fully_compensated(&self) -> bool {
        self.compensation_errors.is_empty()
    }

    pub fn into_error(self) -> CloudError {
        self.error
    }
}

impl From<CloudError> for OperationFailure {
    fn from(error: CloudError) -> Self {
        Self::bare(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failure_displays_original_error() {
        let failure = OperationFailure {
            error: CloudError::TerminalFailure {
                kind: ResourceKind::Snapshot,
                id: "s-1".to_string(),
                status: "failed".to_string(),
            },
            completed: vec![Step::Created {
                kind: ResourceKind::Snapshot,
                id: "s-1".to_string(),
            }],
            compensation_errors: vec![CloudError::Transport("boom".to_string())],
        };

        assert_eq!(
            failure.to_string(),
            "snapshot s-1 reached failure state 'failed'"
        );
        assert!(!failure.fully_compensated());
        assert!(!failure.is_timeout());
    }

    #[test]
    fn test_timeout_detection() {
        let err = CloudError::Timeout {
            description: "volume d-1".to_string(),
            elapsed: Duration::from_secs(3),
            attempts: 4,
        };
        assert!(err.is_timeout());
        assert!(OperationFailure::bare(err).is_timeout());
    }
}
