//! Bedrock Agent service
//!
//! Wraps the Bedrock Agent (build-time) API: knowledge-base ingestion jobs,
//! agent preparation, aliases and prompt updates.

use async_trait::async_trait;
use aws_sdk_bedrockagent::{
    types::{
        CreationMode, InferenceConfiguration, PromptConfiguration, PromptOverrideConfiguration,
        PromptState, PromptType,
    },
    Client as BedrockAgentSdkClient,
};

use super::ServiceError;
use crate::prompts::{PromptKind, PromptOverrides};

/// Bedrock Agent operations used during provisioning and teardown
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// Start syncing a knowledge-base data source. Returns the ingestion job id.
    async fn start_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
    ) -> Result<String, ServiceError>;

    /// Current ingestion job status (STARTING, IN_PROGRESS, COMPLETE, FAILED)
    async fn ingestion_job_status(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
        ingestion_job_id: &str,
    ) -> Result<String, ServiceError>;

    async fn prepare_agent(&self, agent_id: &str) -> Result<(), ServiceError>;

    /// Current agent status (CREATING, PREPARING, PREPARED, UPDATING, FAILED, ...)
    async fn agent_status(&self, agent_id: &str) -> Result<String, ServiceError>;

    /// Create an alias. Returns the alias id.
    async fn create_agent_alias(
        &self,
        agent_id: &str,
        alias_name: &str,
        description: &str,
    ) -> Result<String, ServiceError>;

    async fn agent_alias_status(
        &self,
        agent_id: &str,
        alias_id: &str,
    ) -> Result<String, ServiceError>;

    /// Replace the agent's prompts, keeping its model and instruction
    async fn update_agent_prompts(
        &self,
        agent_id: &str,
        agent_name: &str,
        agent_resource_role_arn: &str,
        prompts: &PromptOverrides,
    ) -> Result<(), ServiceError>;

    async fn list_agent_alias_ids(&self, agent_id: &str) -> Result<Vec<String>, ServiceError>;

    async fn delete_agent_alias(&self, agent_id: &str, alias_id: &str)
        -> Result<(), ServiceError>;

    async fn delete_agent(&self, agent_id: &str) -> Result<(), ServiceError>;
}

/// Service wrapping the AWS Bedrock Agent SDK client
#[derive(Clone, Debug)]
pub struct BedrockAgentService {
    client: BedrockAgentSdkClient,
}

impl BedrockAgentService {
    pub fn new(client: BedrockAgentSdkClient) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying AWS SDK client
    pub fn client(&self) -> &BedrockAgentSdkClient {
        &self.client
    }
}

/// Convert prompt overrides into the SDK representation
fn prompt_override_configuration(
    prompts: &PromptOverrides,
) -> Result<PromptOverrideConfiguration, ServiceError> {
    let configurations = prompts
        .prompts
        .iter()
        .map(|prompt| {
            let prompt_type = match prompt.kind {
                PromptKind::PreProcessing => PromptType::PreProcessing,
                PromptKind::Orchestration => PromptType::Orchestration,
            };

            let inference = InferenceConfiguration::builder()
                .temperature(prompt.inference.temperature)
                .top_p(prompt.inference.top_p)
                .top_k(prompt.inference.top_k)
                .maximum_length(prompt.inference.maximum_length)
                .set_stop_sequences(Some(prompt.inference.stop_sequences.clone()))
                .build();

            PromptConfiguration::builder()
                .prompt_type(prompt_type)
                .prompt_creation_mode(CreationMode::Overridden)
                .prompt_state(PromptState::Enabled)
                .base_prompt_template(prompt.base_template.clone())
                .inference_configuration(inference)
                .parser_mode(CreationMode::Default)
                .build()
        })
        .collect::<Vec<_>>();

    PromptOverrideConfiguration::builder()
        .set_prompt_configurations(Some(configurations))
        .build()
        .map_err(|e| ServiceError::InvalidRequest {
            operation: "UpdateAgent",
            message: e.to_string(),
        })
}

#[async_trait]
impl AgentApi for BedrockAgentService {
    async fn start_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
    ) -> Result<String, ServiceError> {
        tracing::debug!(
            knowledge_base_id = %knowledge_base_id,
            data_source_id = %data_source_id,
            "Calling Bedrock StartIngestionJob"
        );

        let output = self
            .client
            .start_ingestion_job()
            .knowledge_base_id(knowledge_base_id)
            .data_source_id(data_source_id)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("StartIngestionJob", e))?;

        output
            .ingestion_job()
            .map(|job| job.ingestion_job_id().to_string())
            .ok_or(ServiceError::MissingField {
                operation: "StartIngestionJob",
                field: "ingestionJob",
            })
    }

    async fn ingestion_job_status(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
        ingestion_job_id: &str,
    ) -> Result<String, ServiceError> {
        let output = self
            .client
            .get_ingestion_job()
            .knowledge_base_id(knowledge_base_id)
            .data_source_id(data_source_id)
            .ingestion_job_id(ingestion_job_id)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("GetIngestionJob", e))?;

        output
            .ingestion_job()
            .map(|job| job.status().as_str().to_string())
            .ok_or(ServiceError::MissingField {
                operation: "GetIngestionJob",
                field: "ingestionJob",
            })
    }

    async fn prepare_agent(&self, agent_id: &str) -> Result<(), ServiceError> {
        tracing::debug!(agent_id = %agent_id, "Calling Bedrock PrepareAgent");

        self.client
            .prepare_agent()
            .agent_id(agent_id)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("PrepareAgent", e))?;

        Ok(())
    }

    async fn agent_status(&self, agent_id: &str) -> Result<String, ServiceError> {
        let output = self
            .client
            .get_agent()
            .agent_id(agent_id)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("GetAgent", e))?;

        output
            .agent()
            .map(|agent| agent.agent_status().as_str().to_string())
            .ok_or(ServiceError::MissingField {
                operation: "GetAgent",
                field: "agent",
            })
    }

    async fn create_agent_alias(
        &self,
        agent_id: &str,
        alias_name: &str,
        description: &str,
    ) -> Result<String, ServiceError> {
        tracing::debug!(
            agent_id = %agent_id,
            alias_name = %alias_name,
            "Calling Bedrock CreateAgentAlias"
        );

        let output = self
            .client
            .create_agent_alias()
            .agent_id(agent_id)
            .agent_alias_name(alias_name)
            .description(description)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("CreateAgentAlias", e))?;

        output
            .agent_alias()
            .map(|alias| alias.agent_alias_id().to_string())
            .ok_or(ServiceError::MissingField {
                operation: "CreateAgentAlias",
                field: "agentAlias",
            })
    }

    async fn agent_alias_status(
        &self,
        agent_id: &str,
        alias_id: &str,
    ) -> Result<String, ServiceError> {
        let output = self
            .client
            .get_agent_alias()
            .agent_id(agent_id)
            .agent_alias_id(alias_id)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("GetAgentAlias", e))?;

        output
            .agent_alias()
            .map(|alias| alias.agent_alias_status().as_str().to_string())
            .ok_or(ServiceError::MissingField {
                operation: "GetAgentAlias",
                field: "agentAlias",
            })
    }

    async fn update_agent_prompts(
        &self,
        agent_id: &str,
        agent_name: &str,
        agent_resource_role_arn: &str,
        prompts: &PromptOverrides,
    ) -> Result<(), ServiceError> {
        let configuration = prompt_override_configuration(prompts)?;

        // UpdateAgent replaces the whole definition; carry over what we do not change.
        let current = self
            .client
            .get_agent()
            .agent_id(agent_id)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("GetAgent", e))?;
        let agent = current.agent().ok_or(ServiceError::MissingField {
            operation: "GetAgent",
            field: "agent",
        })?;

        tracing::debug!(agent_id = %agent_id, "Calling Bedrock UpdateAgent with prompt overrides");

        self.client
            .update_agent()
            .agent_id(agent_id)
            .agent_name(agent_name)
            .agent_resource_role_arn(agent_resource_role_arn)
            .set_foundation_model(agent.foundation_model().map(str::to_string))
            .set_instruction(agent.instruction().map(str::to_string))
            .set_description(agent.description().map(str::to_string))
            .prompt_override_configuration(configuration)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("UpdateAgent", e))?;

        Ok(())
    }

    async fn list_agent_alias_ids(&self, agent_id: &str) -> Result<Vec<String>, ServiceError> {
        let mut alias_ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_agent_aliases()
                .agent_id(agent_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ServiceError::from_sdk("ListAgentAliases", e))?;

            alias_ids.extend(
                output
                    .agent_alias_summaries()
                    .iter()
                    .map(|summary| summary.agent_alias_id().to_string()),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(alias_ids)
    }

    async fn delete_agent_alias(
        &self,
        agent_id: &str,
        alias_id: &str,
    ) -> Result<(), ServiceError> {
        self.client
            .delete_agent_alias()
            .agent_id(agent_id)
            .agent_alias_id(alias_id)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("DeleteAgentAlias", e))?;

        Ok(())
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), ServiceError> {
        self.client
            .delete_agent()
            .agent_id(agent_id)
            .skip_resource_in_use_check(false)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("DeleteAgent", e))?;

        Ok(())
    }
}
