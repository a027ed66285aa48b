//! Shared AWS SDK setup
//!
//! One `SdkConfig` per process feeds the Glue and Bedrock Agent clients and
//! supplies the credentials that sign OpenSearch Serverless requests.

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_bedrockagent::Client as BedrockAgentSdkClient;
use aws_sdk_glue::Client as GlueSdkClient;

use crate::config::Settings;
use crate::error::ConfigError;

/// Builds the SDK config and service clients from [`Settings`]
///
/// The configured region is tried first, then the default provider chain.
/// Endpoint overrides point a client at a local emulator.
pub struct AwsConfigBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> AwsConfigBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Load region and credentials providers
    pub async fn build_sdk_config(&self) -> SdkConfig {
        let region_provider =
            RegionProviderChain::first_try(Region::new(self.settings.aws_region.clone()))
                .or_default_provider();

        aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await
    }

    /// Create a Glue client with optional custom endpoint
    pub fn build_glue_client(&self, sdk_config: &SdkConfig) -> GlueSdkClient {
        if let Some(endpoint_url) = &self.settings.glue_endpoint_url {
            tracing::info!(endpoint = %endpoint_url, "Using custom Glue endpoint");

            let glue_config = aws_sdk_glue::config::Builder::from(sdk_config)
                .endpoint_url(endpoint_url)
                .build();

            GlueSdkClient::from_conf(glue_config)
        } else {
            GlueSdkClient::new(sdk_config)
        }
    }

    /// Create a Bedrock Agent client with optional custom endpoint
    pub fn build_bedrock_agent_client(&self, sdk_config: &SdkConfig) -> BedrockAgentSdkClient {
        if let Some(endpoint_url) = &self.settings.bedrock_agent_endpoint_url {
            tracing::info!(endpoint = %endpoint_url, "Using custom Bedrock Agent endpoint");

            let agent_config = aws_sdk_bedrockagent::config::Builder::from(sdk_config)
                .endpoint_url(endpoint_url)
                .build();

            BedrockAgentSdkClient::from_conf(agent_config)
        } else {
            BedrockAgentSdkClient::new(sdk_config)
        }
    }
}

pub async fn build_aws_config(settings: &Settings) -> SdkConfig {
    AwsConfigBuilder::new(settings).build_sdk_config().await
}

pub fn create_glue_client(settings: &Settings, sdk_config: &SdkConfig) -> GlueSdkClient {
    AwsConfigBuilder::new(settings).build_glue_client(sdk_config)
}

pub fn create_bedrock_agent_client(
    settings: &Settings,
    sdk_config: &SdkConfig,
) -> BedrockAgentSdkClient {
    AwsConfigBuilder::new(settings).build_bedrock_agent_client(sdk_config)
}

/// Credentials provider of the loaded configuration
pub fn credentials_provider(
    sdk_config: &SdkConfig,
) -> Result<SharedCredentialsProvider, ConfigError> {
    sdk_config
        .credentials_provider()
        .ok_or(ConfigError::Missing("AWS credentials provider"))
}
