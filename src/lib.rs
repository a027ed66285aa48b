//! Agent provisioner library
//!
//! Drives the long-running AWS operations behind a Bedrock agent deployment
//! (Glue crawler, knowledge base ingestion, agent preparation, alias
//! creation, vector index creation) to a terminal state from CloudFormation
//! custom resource Lambdas.

// Public modules
pub mod config;
pub mod custom_resource;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod operations;
pub mod prompts;
pub mod provisioner;
pub mod services;
pub mod waiter;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::Settings;
pub use error::{ConfigError, ProvisionError};
pub use provisioner::{Provisioner, ProvisioningStep};
pub use waiter::{AsyncOperationWaiter, BackoffPolicy, WaitOutcome, WaitResult};
