//! Glue crawler run

use async_trait::async_trait;

use super::{OperationKind, StepReport};
use crate::services::{CrawlerApi, ServiceError};
use crate::waiter::{
    AsyncOperationWaiter, BackoffPolicy, Operation, Sleeper, StatusPoller, StatusTable,
};

/// Glue crawler states. No failure state is modeled: a crawler returns to
/// READY even when its last run failed.
pub const CRAWLER_STATUSES: StatusTable = StatusTable::new(&["READY"], &["RUNNING", "STOPPING"], &[]);

/// Polls `GetCrawler` for the crawler named by the handle
pub struct CrawlerStatus<'a, G: ?Sized> {
    glue: &'a G,
}

impl<'a, G: CrawlerApi + ?Sized> CrawlerStatus<'a, G> {
    pub fn new(glue: &'a G) -> Self {
        Self { glue }
    }
}

#[async_trait]
impl<G: CrawlerApi + ?Sized> StatusPoller for CrawlerStatus<'_, G> {
    type Error = ServiceError;

    async fn poll_status(&self, handle: &str) -> Result<String, ServiceError> {
        self.glue.crawler_state(handle).await
    }
}

/// Start the crawler and wait for it to return to READY
pub async fn run_glue_crawler<G, S>(
    glue: &G,
    crawler_name: &str,
    waiter: &AsyncOperationWaiter<S>,
    policy: &BackoffPolicy,
) -> Result<StepReport, ServiceError>
where
    G: CrawlerApi + ?Sized,
    S: Sleeper,
{
    glue.start_crawler(crawler_name).await?;
    tracing::info!(crawler = %crawler_name, "Triggered crawler, waiting for it to complete");

    let poller = CrawlerStatus::new(glue);
    let operation = Operation::new(
        OperationKind::CrawlerRun,
        crawler_name,
        &poller,
        CRAWLER_STATUSES,
    );
    let outcome = waiter.wait(&operation, policy).await?;

    Ok(StepReport::new(OperationKind::CrawlerRun, crawler_name, outcome))
}
