//! Provisioning error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::services::ServiceError;
use crate::waiter::OperationKind;

/// Configuration could not be loaded or is invalid
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot use prompt template {}: {message}", .path.display())]
    Template { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{operation} {handle} failed with status {status}")]
    OperationFailed {
        operation: OperationKind,
        handle: String,
        status: String,
    },

    #[error("{operation} {handle} did not finish after {polls} polls (last status: {})", .last_status.as_deref().unwrap_or("none"))]
    TimedOut {
        operation: OperationKind,
        handle: String,
        polls: u32,
        last_status: Option<String>,
    },

    #[error("{operation} {handle} reported unexpected status {status}")]
    UnexpectedState {
        operation: OperationKind,
        handle: String,
        status: String,
    },

    /// Given up so the response can still be sent before the invocation ends
    #[error("{operation} did not finish within the {}s left in the invocation", .budget.as_secs())]
    DeadlineExceeded {
        operation: OperationKind,
        budget: Duration,
    },

    #[error("invalid custom resource request: {0}")]
    InvalidRequest(String),

    #[error("failed to deliver custom resource response: {0}")]
    ResponseDelivery(String),
}

impl ProvisionError {
    /// Operation the error came from, when it came from a wait
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            ProvisionError::OperationFailed { operation, .. }
            | ProvisionError::TimedOut { operation, .. }
            | ProvisionError::UnexpectedState { operation, .. }
            | ProvisionError::DeadlineExceeded { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
