//! CloudFormation custom resource response and its delivery

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{Map, Value};

use super::CustomResourceRequest;
use crate::error::ProvisionError;

/// CloudFormation caps the whole response body at 4096 bytes
const MAX_REASON_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: Map<String, Value>,
}

impl CustomResourceResponse {
    pub fn new(
        request: &CustomResourceRequest,
        status: ResponseStatus,
        reason: impl Into<String>,
        physical_resource_id: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            status,
            reason: truncate(reason.into(), MAX_REASON_LEN),
            physical_resource_id: physical_resource_id.into(),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data,
        }
    }
}

fn truncate(mut text: String, max_len: usize) -> String {
    if text.len() > max_len {
        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// Delivers a response to the request's `ResponseURL`
#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ProvisionError>;
}

/// PUTs the response JSON to the pre-signed URL
#[derive(Debug, Clone, Default)]
pub struct HttpResponseSender {
    http: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ProvisionError> {
        let body = serde_json::to_string(response)
            .map_err(|e| ProvisionError::ResponseDelivery(e.to_string()))?;

        // The URL is pre-signed without a content type, so none may be sent
        let result = self
            .http
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(|e| ProvisionError::ResponseDelivery(e.to_string()))?;

        let status = result.status();
        if !status.is_success() {
            let text = result.text().await.unwrap_or_default();
            return Err(ProvisionError::ResponseDelivery(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        tracing::info!(
            status = ?response.status,
            physical_resource_id = %response.physical_resource_id,
            "Custom resource response delivered"
        );

        Ok(())
    }
}
