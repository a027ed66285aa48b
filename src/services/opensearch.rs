//! OpenSearch Serverless index service
//!
//! Index management calls against a vector collection endpoint, signed with
//! SigV4 for the `aoss` service.

use std::time::SystemTime;

use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{
    sign, PayloadChecksumKind, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::{Method, StatusCode};

use super::ServiceError;

/// Signing name of OpenSearch Serverless
pub const AOSS_SERVICE_NAME: &str = "aoss";

/// Index operations on a vector collection
#[async_trait]
pub trait VectorIndexApi: Send + Sync {
    async fn create_index(
        &self,
        index_name: &str,
        body: &serde_json::Value,
    ) -> Result<(), ServiceError>;

    async fn index_exists(&self, index_name: &str) -> Result<bool, ServiceError>;

    async fn delete_index(&self, index_name: &str) -> Result<(), ServiceError>;
}

/// SigV4-signed HTTP client for one OpenSearch Serverless collection
#[derive(Clone, Debug)]
pub struct OpenSearchIndexService {
    http: reqwest::Client,
    host: String,
    endpoint: String,
    region: String,
    credentials: SharedCredentialsProvider,
}

impl OpenSearchIndexService {
    /// Create a service for the collection at `host` (no scheme)
    pub fn new(
        http: reqwest::Client,
        host: impl Into<String>,
        region: impl Into<String>,
        credentials: SharedCredentialsProvider,
    ) -> Self {
        let host = host.into();
        Self {
            http,
            endpoint: format!("https://{}", host),
            host,
            region: region.into(),
            credentials,
        }
    }

    /// Send requests to `endpoint` (scheme included) instead of the collection host
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, index_name: &str) -> String {
        format!("{}/{}", self.endpoint, index_name)
    }

    async fn signed_request(
        &self,
        operation: &'static str,
        method: Method,
        url: &str,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, ServiceError> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| ServiceError::Credentials(e.to_string()))?;
        let identity: Identity = credentials.into();

        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(AOSS_SERVICE_NAME)
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(|e| ServiceError::Signing {
                operation,
                message: e.to_string(),
            })?
            .into();

        let headers = [("content-type", "application/json")];
        let signable = SignableRequest::new(
            method.as_str(),
            url,
            headers.iter().copied(),
            SignableBody::Bytes(&body),
        )
        .map_err(|e| ServiceError::Signing {
            operation,
            message: e.to_string(),
        })?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| ServiceError::Signing {
                operation,
                message: e.to_string(),
            })?
            .into_parts();

        let mut request = self
            .http
            .request(method, url)
            .header("content-type", "application/json");
        for (name, value) in instructions.headers() {
            request = request.header(name, value);
        }

        request
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport {
                operation,
                message: e.to_string(),
            })
    }
}

async fn ensure_success(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<(), ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Http {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl VectorIndexApi for OpenSearchIndexService {
    async fn create_index(
        &self,
        index_name: &str,
        body: &serde_json::Value,
    ) -> Result<(), ServiceError> {
        let payload = serde_json::to_vec(body).map_err(|e| ServiceError::InvalidRequest {
            operation: "CreateIndex",
            message: e.to_string(),
        })?;

        tracing::debug!(index = %index_name, host = %self.host, "Creating vector index");

        let response = self
            .signed_request("CreateIndex", Method::PUT, &self.url(index_name), payload)
            .await?;
        ensure_success("CreateIndex", response).await
    }

    async fn index_exists(&self, index_name: &str) -> Result<bool, ServiceError> {
        let response = self
            .signed_request("IndexExists", Method::HEAD, &self.url(index_name), Vec::new())
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(ServiceError::Http {
                operation: "IndexExists",
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn delete_index(&self, index_name: &str) -> Result<(), ServiceError> {
        tracing::debug!(index = %index_name, host = %self.host, "Deleting vector index");

        let response = self
            .signed_request("DeleteIndex", Method::DELETE, &self.url(index_name), Vec::new())
            .await?;
        ensure_success("DeleteIndex", response).await
    }
}
