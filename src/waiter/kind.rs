use serde::{Deserialize, Serialize};
use std::fmt;

/// Which asynchronous provisioning step an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    CrawlerRun,
    IngestionJob,
    AgentPreparation,
    AgentAliasCreation,
    AgentPromptUpdate,
    VectorIndexCreation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::CrawlerRun => write!(f, "glue crawler run"),
            OperationKind::IngestionJob => write!(f, "knowledge base ingestion job"),
            OperationKind::AgentPreparation => write!(f, "agent preparation"),
            OperationKind::AgentAliasCreation => write!(f, "agent alias creation"),
            OperationKind::AgentPromptUpdate => write!(f, "agent prompt update"),
            OperationKind::VectorIndexCreation => write!(f, "vector index creation"),
        }
    }
}
