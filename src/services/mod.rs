//! Services module
//!
//! AWS service adapters. Each backend is exposed through a small trait so the
//! provisioning logic can be exercised without AWS.

pub mod bedrock_agent;
pub mod error;
pub mod glue;
pub mod opensearch;

pub use bedrock_agent::{AgentApi, BedrockAgentService};
pub use error::ServiceError;
pub use glue::{CrawlerApi, GlueService};
pub use opensearch::{OpenSearchIndexService, VectorIndexApi, AOSS_SERVICE_NAME};
