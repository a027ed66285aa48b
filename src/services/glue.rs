//! Glue service for crawler runs
//!
//! The crawler catalogs the uploaded data into the Glue database queried by
//! the agent's action group.

use async_trait::async_trait;
use aws_sdk_glue::Client as GlueSdkClient;

use super::ServiceError;

/// Crawler operations used during provisioning
#[async_trait]
pub trait CrawlerApi: Send + Sync {
    /// Start a crawler run
    async fn start_crawler(&self, crawler_name: &str) -> Result<(), ServiceError>;

    /// Current crawler state (READY, RUNNING, STOPPING)
    async fn crawler_state(&self, crawler_name: &str) -> Result<String, ServiceError>;
}

/// Service wrapping the AWS Glue SDK client
#[derive(Clone, Debug)]
pub struct GlueService {
    client: GlueSdkClient,
}

impl GlueService {
    pub fn new(client: GlueSdkClient) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying AWS SDK client
    pub fn client(&self) -> &GlueSdkClient {
        &self.client
    }
}

#[async_trait]
impl CrawlerApi for GlueService {
    async fn start_crawler(&self, crawler_name: &str) -> Result<(), ServiceError> {
        tracing::debug!(crawler = %crawler_name, "Calling Glue StartCrawler");

        self.client
            .start_crawler()
            .name(crawler_name)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("StartCrawler", e))?;

        Ok(())
    }

    async fn crawler_state(&self, crawler_name: &str) -> Result<String, ServiceError> {
        let output = self
            .client
            .get_crawler()
            .name(crawler_name)
            .send()
            .await
            .map_err(|e| ServiceError::from_sdk("GetCrawler", e))?;

        output
            .crawler()
            .and_then(|crawler| crawler.state())
            .map(|state| state.as_str().to_string())
            .ok_or(ServiceError::MissingField {
                operation: "GetCrawler",
                field: "Crawler.State",
            })
    }
}
