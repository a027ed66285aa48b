//! Agent preparation and prompt update
//!
//! Both steps poll `GetAgent`, with different in-progress vocabularies.

use async_trait::async_trait;

use super::{OperationKind, StepReport};
use crate::prompts::PromptOverrides;
use crate::services::{AgentApi, ServiceError};
use crate::waiter::{
    AsyncOperationWaiter, BackoffPolicy, Operation, Sleeper, StatusPoller, StatusTable,
};

pub const AGENT_PREPARATION_STATUSES: StatusTable = StatusTable::new(
    &["PREPARED"],
    &["CREATING", "UPDATING", "PREPARING"],
    &["FAILED"],
);

pub const PROMPT_UPDATE_STATUSES: StatusTable =
    StatusTable::new(&["PREPARED"], &["UPDATING"], &["FAILED"]);

/// Polls `GetAgent`; the handle is the agent id
pub struct AgentStatus<'a, A: ?Sized> {
    agents: &'a A,
}

impl<'a, A: AgentApi + ?Sized> AgentStatus<'a, A> {
    pub fn new(agents: &'a A) -> Self {
        Self { agents }
    }
}

#[async_trait]
impl<A: AgentApi + ?Sized> StatusPoller for AgentStatus<'_, A> {
    type Error = ServiceError;

    async fn poll_status(&self, handle: &str) -> Result<String, ServiceError> {
        self.agents.agent_status(handle).await
    }
}

/// Prepare the agent and wait until it is PREPARED
pub async fn prepare_agent<A, S>(
    agents: &A,
    agent_id: &str,
    waiter: &AsyncOperationWaiter<S>,
    policy: &BackoffPolicy,
) -> Result<StepReport, ServiceError>
where
    A: AgentApi + ?Sized,
    S: Sleeper,
{
    agents.prepare_agent(agent_id).await?;
    tracing::info!(agent_id = %agent_id, "Agent preparation started");

    let poller = AgentStatus::new(agents);
    let operation = Operation::new(
        OperationKind::AgentPreparation,
        agent_id,
        &poller,
        AGENT_PREPARATION_STATUSES,
    );
    let outcome = waiter.wait(&operation, policy).await?;

    Ok(StepReport::new(OperationKind::AgentPreparation, agent_id, outcome))
}

/// Replace the agent's pre-processing and orchestration prompts
pub async fn update_agent_prompts<A, S>(
    agents: &A,
    agent_id: &str,
    agent_name: &str,
    agent_resource_role_arn: &str,
    prompts: &PromptOverrides,
    waiter: &AsyncOperationWaiter<S>,
    policy: &BackoffPolicy,
) -> Result<StepReport, ServiceError>
where
    A: AgentApi + ?Sized,
    S: Sleeper,
{
    agents
        .update_agent_prompts(agent_id, agent_name, agent_resource_role_arn, prompts)
        .await?;
    tracing::info!(agent_id = %agent_id, "Agent prompt update started");

    let poller = AgentStatus::new(agents);
    let operation = Operation::new(
        OperationKind::AgentPromptUpdate,
        agent_id,
        &poller,
        PROMPT_UPDATE_STATUSES,
    );
    let outcome = waiter.wait(&operation, policy).await?;

    Ok(StepReport::new(OperationKind::AgentPromptUpdate, agent_id, outcome))
}
