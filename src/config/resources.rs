//! Identifiers of the provisioned resources
//!
//! These are injected by the deployment as Lambda environment variables.

use std::env;
use std::path::PathBuf;

use serde::Serialize;

use super::settings::{optional, or_default, parse_or, required};
use crate::error::ConfigError;
use crate::prompts::PromptOverrides;

/// Resources driven by the agent provisioning Lambda
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResources {
    pub crawler_name: String,
    pub knowledge_base_id: String,
    pub data_source_id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub agent_alias_name: String,
    pub agent_alias_description: String,
    pub agent_resource_role_arn: String,

    /// Whether Create also overrides the agent prompts
    pub update_agent_prompts: bool,
    pub preprocessing_template_path: Option<PathBuf>,
    pub orchestration_template_path: Option<PathBuf>,
}

impl AgentResources {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resources = Self {
            crawler_name: required(&lookup, "GLUE_CRAWLER_NAME")?,
            knowledge_base_id: required(&lookup, "KNOWLEDGEBASE_ID")?,
            data_source_id: required(&lookup, "KNOWLEDGEBASE_DATASOURCE_ID")?,
            agent_id: required(&lookup, "BEDROCK_AGENT_ID")?,
            agent_name: required(&lookup, "BEDROCK_AGENT_NAME")?,
            agent_alias_name: required(&lookup, "BEDROCK_AGENT_ALIAS")?,
            agent_alias_description: or_default(
                &lookup,
                "AGENT_ALIAS_DESCRIPTION",
                "agent alias description",
            ),
            agent_resource_role_arn: required(&lookup, "BEDROCK_AGENT_RESOURCE_ROLE_ARN")?,
            update_agent_prompts: parse_or(&lookup, "UPDATE_AGENT_PROMPTS", false)?,
            preprocessing_template_path: optional(&lookup, "PREPROCESSING_TEMPLATE_PATH")
                .map(PathBuf::from),
            orchestration_template_path: optional(&lookup, "ORCHESTRATION_TEMPLATE_PATH")
                .map(PathBuf::from),
        };

        if resources.update_agent_prompts {
            if resources.preprocessing_template_path.is_none() {
                return Err(ConfigError::Missing("PREPROCESSING_TEMPLATE_PATH"));
            }
            if resources.orchestration_template_path.is_none() {
                return Err(ConfigError::Missing("ORCHESTRATION_TEMPLATE_PATH"));
            }
        }

        Ok(resources)
    }

    /// Read the prompt templates when prompt updates are enabled
    pub fn load_prompts(&self) -> Result<Option<PromptOverrides>, ConfigError> {
        match (
            self.update_agent_prompts,
            &self.preprocessing_template_path,
            &self.orchestration_template_path,
        ) {
            (true, Some(preprocessing), Some(orchestration)) => {
                PromptOverrides::load(preprocessing, orchestration).map(Some)
            }
            (true, None, _) => Err(ConfigError::Missing("PREPROCESSING_TEMPLATE_PATH")),
            (true, _, None) => Err(ConfigError::Missing("ORCHESTRATION_TEMPLATE_PATH")),
            (false, _, _) => Ok(None),
        }
    }
}

/// Vector index managed by the index Lambda
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorIndexConfig {
    /// Collection endpoint host, without scheme
    pub collection_host: String,
    pub index_name: String,
    pub vector_field: String,
    pub dimension: u32,
    pub region: String,
}

impl VectorIndexConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_host = required(&lookup, "COLLECTION_HOST")?;
        let collection_host = strip_scheme(&raw_host);
        if collection_host.is_empty() {
            return Err(ConfigError::Invalid {
                key: "COLLECTION_HOST",
                value: raw_host,
                reason: "no host name".to_string(),
            });
        }

        let dimension = parse_or(&lookup, "VECTOR_DIMENSION", 1536u32)?;
        if dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "VECTOR_DIMENSION",
                value: dimension.to_string(),
                reason: "must be > 0".to_string(),
            });
        }

        let region = optional(&lookup, "REGION_NAME")
            .or_else(|| optional(&lookup, "AWS_REGION"))
            .ok_or(ConfigError::Missing("REGION_NAME"))?;

        Ok(Self {
            collection_host,
            index_name: required(&lookup, "VECTOR_INDEX_NAME")?,
            vector_field: required(&lookup, "VECTOR_FIELD_NAME")?,
            dimension,
            region,
        })
    }
}

/// `https://host/` -> `host`
fn strip_scheme(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme.trim_end_matches('/').to_string()
}
