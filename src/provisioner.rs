//! Agent provisioning sequence and teardown
//!
//! Create runs the crawler, syncs the knowledge base data source, prepares
//! the agent and publishes an alias, optionally overriding the agent prompts
//! at the end. Each step is started once and awaited before the next begins.
//! Delete removes every alias of the agent and then the agent itself.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::config::AgentResources;
use crate::custom_resource::{within_deadline, HandlerOutput, InvocationContext};
use crate::error::ProvisionError;
use crate::operations::{
    create_agent_alias, prepare_agent, run_glue_crawler, sync_data_source, update_agent_prompts,
    OperationKind, StepReport,
};
use crate::prompts::PromptOverrides;
use crate::services::{AgentApi, CrawlerApi, ServiceError};
use crate::waiter::{AsyncOperationWaiter, PollingPolicies, Sleeper, TokioSleeper};

/// Resource property selecting a subset of steps
pub const STEPS_PROPERTY: &str = "Steps";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ProvisioningStep {
    GlueCrawler,
    DataSourceSync,
    PrepareAgent,
    CreateAgentAlias,
    UpdateAgentPrompts,
}

impl ProvisioningStep {
    pub fn operation(&self) -> OperationKind {
        match self {
            ProvisioningStep::GlueCrawler => OperationKind::CrawlerRun,
            ProvisioningStep::DataSourceSync => OperationKind::IngestionJob,
            ProvisioningStep::PrepareAgent => OperationKind::AgentPreparation,
            ProvisioningStep::CreateAgentAlias => OperationKind::AgentAliasCreation,
            ProvisioningStep::UpdateAgentPrompts => OperationKind::AgentPromptUpdate,
        }
    }

    /// Key under which the step's handle is reported in the response `Data`
    pub fn output_key(&self) -> &'static str {
        match self {
            ProvisioningStep::GlueCrawler => "CrawlerName",
            ProvisioningStep::DataSourceSync => "IngestionJobId",
            ProvisioningStep::PrepareAgent | ProvisioningStep::UpdateAgentPrompts => "AgentId",
            ProvisioningStep::CreateAgentAlias => "AgentAliasId",
        }
    }

    fn from_operation(kind: OperationKind) -> Option<Self> {
        match kind {
            OperationKind::CrawlerRun => Some(ProvisioningStep::GlueCrawler),
            OperationKind::IngestionJob => Some(ProvisioningStep::DataSourceSync),
            OperationKind::AgentPreparation => Some(ProvisioningStep::PrepareAgent),
            OperationKind::AgentAliasCreation => Some(ProvisioningStep::CreateAgentAlias),
            OperationKind::AgentPromptUpdate => Some(ProvisioningStep::UpdateAgentPrompts),
            OperationKind::VectorIndexCreation => None,
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.operation(), f)
    }
}

/// Steps requested through the `Steps` resource property, if any
pub fn requested_steps(properties: &Value) -> Result<Option<Vec<ProvisioningStep>>, ProvisionError> {
    match properties.get(STEPS_PROPERTY) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value::<Vec<ProvisioningStep>>(value.clone())
            .map(Some)
            .map_err(|e| ProvisionError::InvalidRequest(format!("{}: {}", STEPS_PROPERTY, e))),
    }
}

/// Reports of the steps that ran, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisionSummary {
    pub reports: Vec<StepReport>,
}

impl ProvisionSummary {
    /// Response data: one entry per step, keyed by [`ProvisioningStep::output_key`]
    pub fn to_output(&self) -> HandlerOutput {
        self.reports
            .iter()
            .filter_map(|report| {
                ProvisioningStep::from_operation(report.kind).map(|step| (step, report))
            })
            .fold(HandlerOutput::empty(), |output, (step, report)| {
                output.with(step.output_key(), report.handle.clone())
            })
    }
}

/// Drives the provisioning steps against the Glue and Bedrock Agent APIs
pub struct Provisioner<G, A, S = TokioSleeper> {
    glue: G,
    agents: A,
    waiter: AsyncOperationWaiter<S>,
    policies: PollingPolicies,
    resources: AgentResources,
    prompts: Option<PromptOverrides>,
}

impl<G, A, S> Provisioner<G, A, S>
where
    G: CrawlerApi,
    A: AgentApi,
    S: Sleeper,
{
    pub fn new(
        glue: G,
        agents: A,
        waiter: AsyncOperationWaiter<S>,
        policies: PollingPolicies,
        resources: AgentResources,
        prompts: Option<PromptOverrides>,
    ) -> Self {
        Self {
            glue,
            agents,
            waiter,
            policies,
            resources,
            prompts,
        }
    }

    pub fn glue(&self) -> &G {
        &self.glue
    }

    pub fn agents(&self) -> &A {
        &self.agents
    }

    pub fn waiter(&self) -> &AsyncOperationWaiter<S> {
        &self.waiter
    }

    pub fn resources(&self) -> &AgentResources {
        &self.resources
    }

    /// The full Create sequence. The prompt update is included only when
    /// prompt overrides are configured.
    pub fn default_steps(&self) -> Vec<ProvisioningStep> {
        let mut steps = vec![
            ProvisioningStep::GlueCrawler,
            ProvisioningStep::DataSourceSync,
            ProvisioningStep::PrepareAgent,
            ProvisioningStep::CreateAgentAlias,
        ];
        if self.prompts.is_some() {
            steps.push(ProvisioningStep::UpdateAgentPrompts);
        }
        steps
    }

    /// Longest `steps` can take when every wait runs out its attempts
    pub fn worst_case_wait(&self, steps: &[ProvisioningStep]) -> Duration {
        steps
            .iter()
            .map(|step| self.policies.for_operation(step.operation()).worst_case_wait())
            .sum()
    }

    /// Start one step and wait for it, failing on any non-success outcome
    pub async fn run_step(&self, step: ProvisioningStep) -> Result<StepReport, ProvisionError> {
        let policy = self.policies.for_operation(step.operation());
        let resources = &self.resources;

        tracing::info!(step = %step, "Starting provisioning step");

        let report = match step {
            ProvisioningStep::GlueCrawler => {
                run_glue_crawler(&self.glue, &resources.crawler_name, &self.waiter, policy).await?
            }
            ProvisioningStep::DataSourceSync => {
                sync_data_source(
                    &self.agents,
                    &resources.knowledge_base_id,
                    &resources.data_source_id,
                    &self.waiter,
                    policy,
                )
                .await?
            }
            ProvisioningStep::PrepareAgent => {
                prepare_agent(&self.agents, &resources.agent_id, &self.waiter, policy).await?
            }
            ProvisioningStep::CreateAgentAlias => {
                create_agent_alias(
                    &self.agents,
                    &resources.agent_id,
                    &resources.agent_alias_name,
                    &resources.agent_alias_description,
                    &self.waiter,
                    policy,
                )
                .await?
            }
            ProvisioningStep::UpdateAgentPrompts => {
                let prompts = self.prompts.as_ref().ok_or_else(|| {
                    ProvisionError::InvalidRequest(
                        "agent prompt update requested but UPDATE_AGENT_PROMPTS is not enabled"
                            .to_string(),
                    )
                })?;
                update_agent_prompts(
                    &self.agents,
                    &resources.agent_id,
                    &resources.agent_name,
                    &resources.agent_resource_role_arn,
                    prompts,
                    &self.waiter,
                    policy,
                )
                .await?
            }
        };

        let report = report.into_result()?;
        tracing::info!(
            step = %step,
            handle = %report.handle,
            polls = report.outcome.polls,
            total_delay_ms = report.outcome.total_delay.as_millis() as u64,
            "Provisioning step finished"
        );
        Ok(report)
    }

    /// Run `steps` in order, stopping at the first failure
    ///
    /// A step that cannot finish before the invocation deadline fails with
    /// [`ProvisionError::DeadlineExceeded`], leaving time to report it.
    pub async fn provision(
        &self,
        steps: &[ProvisioningStep],
        context: &InvocationContext,
    ) -> Result<ProvisionSummary, ProvisionError> {
        if let Some(budget) = context.work_budget() {
            let worst_case = self.worst_case_wait(steps);
            if worst_case > budget {
                tracing::warn!(
                    steps = steps.len(),
                    budget_ms = budget.as_millis() as u64,
                    worst_case_ms = worst_case.as_millis() as u64,
                    "Remaining invocation time is shorter than the polling budget"
                );
            }
        }

        let mut summary = ProvisionSummary::default();
        for step in steps {
            let report = within_deadline(context, step.operation(), self.run_step(*step)).await?;
            summary.reports.push(report);
        }

        Ok(summary)
    }

    /// Delete all aliases of the agent, then the agent. Resources that are
    /// already gone are skipped. Returns the ids of the deleted aliases.
    pub async fn teardown(&self) -> Result<Vec<String>, ProvisionError> {
        let agent_id = &self.resources.agent_id;

        let alias_ids = match self.agents.list_agent_alias_ids(agent_id).await {
            Ok(ids) => ids,
            Err(e) if e.is_not_found() => {
                tracing::info!(agent_id = %agent_id, "Agent already deleted");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut deleted = Vec::with_capacity(alias_ids.len());
        for alias_id in alias_ids {
            match self.agents.delete_agent_alias(agent_id, &alias_id).await {
                Ok(()) => {
                    tracing::info!(agent_id = %agent_id, alias_id = %alias_id, "Deleted agent alias");
                    deleted.push(alias_id);
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!(alias_id = %alias_id, "Agent alias already deleted");
                }
                Err(e) => return Err(e.into()),
            }
        }

        skip_not_found(self.agents.delete_agent(agent_id).await)?;
        tracing::info!(agent_id = %agent_id, aliases = deleted.len(), "Agent deleted");

        Ok(deleted)
    }
}

fn skip_not_found(result: Result<(), ServiceError>) -> Result<(), ProvisionError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other.map_err(ProvisionError::from),
    }
}
