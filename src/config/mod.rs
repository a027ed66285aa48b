//! Configuration management module
//!
//! This module handles loading and validating configuration from environment
//! variables and .env files. Everything is loaded once at startup and passed
//! to the components that need it.

pub mod aws;
pub mod resources;
pub mod settings;

pub use crate::error::ConfigError;
pub use aws::{
    build_aws_config, create_bedrock_agent_client, create_glue_client, credentials_provider,
    AwsConfigBuilder,
};
pub use resources::{AgentResources, VectorIndexConfig};
pub use settings::Settings;
