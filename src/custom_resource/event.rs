//! CloudFormation custom resource request

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::Create => write!(f, "Create"),
            RequestType::Update => write!(f, "Update"),
            RequestType::Delete => write!(f, "Delete"),
        }
    }
}

/// Event delivered to a custom resource Lambda
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: RequestType,

    /// Pre-signed S3 URL the response is PUT to
    #[serde(rename = "ResponseURL")]
    pub response_url: String,

    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,

    /// Absent on Create
    #[serde(default)]
    pub physical_resource_id: Option<String>,

    #[serde(default)]
    pub resource_type: String,

    #[serde(default)]
    pub service_token: Option<String>,

    #[serde(default)]
    pub resource_properties: Value,

    /// Present on Update only
    #[serde(default)]
    pub old_resource_properties: Option<Value>,
}

impl CustomResourceRequest {
    /// A top-level resource property, if present
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.resource_properties.get(key)
    }
}
