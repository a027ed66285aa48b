//! Knowledge-base data source sync

use async_trait::async_trait;

use super::{OperationKind, StepReport};
use crate::services::{AgentApi, ServiceError};
use crate::waiter::{
    AsyncOperationWaiter, BackoffPolicy, Operation, Sleeper, StatusPoller, StatusTable,
};

/// Ingestion job states.
///
/// FAILED is deliberately not declared as a failure state, so a failed job
/// surfaces as an unexpected state.
pub const INGESTION_JOB_STATUSES: StatusTable =
    StatusTable::new(&["COMPLETE"], &["STARTING", "IN_PROGRESS"], &[]);

/// Polls `GetIngestionJob`; the handle is the ingestion job id
pub struct IngestionJobStatus<'a, A: ?Sized> {
    agents: &'a A,
    knowledge_base_id: &'a str,
    data_source_id: &'a str,
}

impl<'a, A: AgentApi + ?Sized> IngestionJobStatus<'a, A> {
    pub fn new(agents: &'a A, knowledge_base_id: &'a str, data_source_id: &'a str) -> Self {
        Self {
            agents,
            knowledge_base_id,
            data_source_id,
        }
    }
}

#[async_trait]
impl<A: AgentApi + ?Sized> StatusPoller for IngestionJobStatus<'_, A> {
    type Error = ServiceError;

    async fn poll_status(&self, handle: &str) -> Result<String, ServiceError> {
        self.agents
            .ingestion_job_status(self.knowledge_base_id, self.data_source_id, handle)
            .await
    }
}

/// Start an ingestion job for the data source and wait for it to complete
pub async fn sync_data_source<A, S>(
    agents: &A,
    knowledge_base_id: &str,
    data_source_id: &str,
    waiter: &AsyncOperationWaiter<S>,
    policy: &BackoffPolicy,
) -> Result<StepReport, ServiceError>
where
    A: AgentApi + ?Sized,
    S: Sleeper,
{
    let job_id = agents
        .start_ingestion_job(knowledge_base_id, data_source_id)
        .await?;
    tracing::info!(
        knowledge_base_id = %knowledge_base_id,
        data_source_id = %data_source_id,
        ingestion_job_id = %job_id,
        "Started knowledge base ingestion job"
    );

    let poller = IngestionJobStatus::new(agents, knowledge_base_id, data_source_id);
    let operation = Operation::new(
        OperationKind::IngestionJob,
        job_id.clone(),
        &poller,
        INGESTION_JOB_STATUSES,
    );
    let outcome = waiter.wait(&operation, policy).await?;

    Ok(StepReport::new(OperationKind::IngestionJob, job_id, outcome))
}
