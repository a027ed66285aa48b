//! Agent alias creation

use async_trait::async_trait;

use super::{OperationKind, StepReport};
use crate::services::{AgentApi, ServiceError};
use crate::waiter::{
    AsyncOperationWaiter, BackoffPolicy, Operation, Sleeper, StatusPoller, StatusTable,
};

pub const AGENT_ALIAS_STATUSES: StatusTable =
    StatusTable::new(&["PREPARED"], &["CREATING", "UPDATING"], &["FAILED"]);

/// Polls `GetAgentAlias`; the handle is the alias id
pub struct AgentAliasStatus<'a, A: ?Sized> {
    agents: &'a A,
    agent_id: &'a str,
}

impl<'a, A: AgentApi + ?Sized> AgentAliasStatus<'a, A> {
    pub fn new(agents: &'a A, agent_id: &'a str) -> Self {
        Self { agents, agent_id }
    }
}

#[async_trait]
impl<A: AgentApi + ?Sized> StatusPoller for AgentAliasStatus<'_, A> {
    type Error = ServiceError;

    async fn poll_status(&self, handle: &str) -> Result<String, ServiceError> {
        self.agents.agent_alias_status(self.agent_id, handle).await
    }
}

/// Create an alias and wait for it to be PREPARED.
///
/// The report's handle is the new alias id.
pub async fn create_agent_alias<A, S>(
    agents: &A,
    agent_id: &str,
    alias_name: &str,
    description: &str,
    waiter: &AsyncOperationWaiter<S>,
    policy: &BackoffPolicy,
) -> Result<StepReport, ServiceError>
where
    A: AgentApi + ?Sized,
    S: Sleeper,
{
    let alias_id = agents
        .create_agent_alias(agent_id, alias_name, description)
        .await?;
    tracing::info!(
        agent_id = %agent_id,
        alias_name = %alias_name,
        alias_id = %alias_id,
        "Agent alias creation started"
    );

    let poller = AgentAliasStatus::new(agents, agent_id);
    let operation = Operation::new(
        OperationKind::AgentAliasCreation,
        alias_id.clone(),
        &poller,
        AGENT_ALIAS_STATUSES,
    );
    let outcome = waiter.wait(&operation, policy).await?;

    Ok(StepReport::new(OperationKind::AgentAliasCreation, alias_id, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAgents, RecordingSleeper};
    use crate::waiter::WaitResult;

    #[tokio::test]
    async fn test_alias_created() {
        let agents = MockAgents::new().with_alias(&["CREATING", "PREPARED"]);
        let waiter = AsyncOperationWaiter::with_sleeper(RecordingSleeper::default());

        let report = create_agent_alias(
            &agents,
            "agent-1",
            "live",
            "agent alias description",
            &waiter,
            &BackoffPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.outcome.result, WaitResult::Succeeded);
        assert_eq!(report.handle, "alias-1");
        assert!(agents.called("create_agent_alias agent-1 live"));
        assert!(agents.called("agent_alias_status agent-1 alias-1"));
    }

    #[tokio::test]
    async fn test_alias_times_out() {
        let agents = MockAgents::new().with_alias(&["CREATING"; 3]);
        let waiter = AsyncOperationWaiter::with_sleeper(RecordingSleeper::default());
        let policy = BackoffPolicy::new().with_max_attempts(3);

        let report = create_agent_alias(&agents, "agent-1", "live", "", &waiter, &policy)
            .await
            .unwrap();

        assert_eq!(
            report.outcome.result,
            WaitResult::TimedOut(Some("CREATING".to_string()))
        );
        assert_eq!(report.outcome.polls, 3);
    }
}
