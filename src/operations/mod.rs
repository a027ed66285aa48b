//! Call-site adaptations of the waiter
//!
//! Every long-running provisioning step is the same shape: one start call, a
//! handle taken from its response, and a status call polled by the waiter.
//! The modules here only differ in which API they call and which status
//! vocabulary they declare.

pub mod agent;
pub mod alias;
pub mod crawler;
pub mod index;
pub mod ingestion;

use crate::error::ProvisionError;
use crate::waiter::{WaitOutcome, WaitResult};

pub use agent::{prepare_agent, update_agent_prompts, AGENT_PREPARATION_STATUSES, PROMPT_UPDATE_STATUSES};
pub use alias::{create_agent_alias, AGENT_ALIAS_STATUSES};
pub use crawler::{run_glue_crawler, CRAWLER_STATUSES};
pub use index::{create_vector_index, vector_index_body, INDEX_SETTLE_TIME, VECTOR_INDEX_STATUSES};
pub use ingestion::{sync_data_source, INGESTION_JOB_STATUSES};
pub use crate::waiter::OperationKind;

/// What a started-and-awaited step produced
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub kind: OperationKind,

    /// Handle the step was polled with (crawler name, job id, alias id, ...)
    pub handle: String,

    pub outcome: WaitOutcome,
}

impl StepReport {
    pub fn new(kind: OperationKind, handle: impl Into<String>, outcome: WaitOutcome) -> Self {
        Self {
            kind,
            handle: handle.into(),
            outcome,
        }
    }

    /// Turn every non-success outcome into a provisioning error
    pub fn into_result(self) -> Result<StepReport, ProvisionError> {
        match &self.outcome.result {
            WaitResult::Succeeded => Ok(self),
            WaitResult::Failed(status) => Err(ProvisionError::OperationFailed {
                operation: self.kind,
                handle: self.handle,
                status: status.clone(),
            }),
            WaitResult::TimedOut(last_status) => Err(ProvisionError::TimedOut {
                operation: self.kind,
                handle: self.handle,
                polls: self.outcome.polls,
                last_status: last_status.clone(),
            }),
            WaitResult::UnexpectedState(status) => Err(ProvisionError::UnexpectedState {
                operation: self.kind,
                handle: self.handle,
                status: status.clone(),
            }),
        }
    }
}
