//! Vector index creation on an OpenSearch Serverless collection
//!
//! The index is polled until it shows up. OpenSearch Serverless usually
//! reports it on the first poll, well before a knowledge base can use it,
//! so a fixed settle time follows a successful wait.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use super::{OperationKind, StepReport};
use crate::services::{ServiceError, VectorIndexApi};
use crate::waiter::{
    AsyncOperationWaiter, BackoffPolicy, Operation, Sleeper, StatusPoller, StatusTable,
};

pub const INDEX_AVAILABLE: &str = "AVAILABLE";
pub const INDEX_MISSING: &str = "MISSING";

/// Pause after the index appears, before a knowledge base is pointed at it
pub const INDEX_SETTLE_TIME: Duration = Duration::from_secs(60);

pub const VECTOR_INDEX_STATUSES: StatusTable =
    StatusTable::new(&[INDEX_AVAILABLE], &[INDEX_MISSING], &[]);

/// Build the k-NN index definition used by the Bedrock knowledge base
pub fn vector_index_body(vector_field: &str, dimension: u32) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        vector_field.to_string(),
        json!({
            "type": "knn_vector",
            "dimension": dimension,
            "method": {
                "space_type": "innerproduct",
                "engine": "FAISS",
                "name": "hnsw",
                "parameters": {
                    "m": 16,
                    "ef_construction": 512
                }
            }
        }),
    );
    properties.insert(
        "AMAZON_BEDROCK_METADATA".to_string(),
        json!({ "type": "text", "index": false }),
    );
    properties.insert(
        "AMAZON_BEDROCK_TEXT_CHUNK".to_string(),
        json!({ "type": "text" }),
    );
    properties.insert("id".to_string(), json!({ "type": "text" }));

    json!({
        "settings": {
            "index.knn": true,
            "index.knn.algo_param.ef_search": 512
        },
        "mappings": {
            "properties": properties
        }
    })
}

/// Reports AVAILABLE once the index exists, MISSING before
pub struct VectorIndexStatus<'a, V: ?Sized> {
    indices: &'a V,
}

impl<'a, V: VectorIndexApi + ?Sized> VectorIndexStatus<'a, V> {
    pub fn new(indices: &'a V) -> Self {
        Self { indices }
    }
}

#[async_trait]
impl<V: VectorIndexApi + ?Sized> StatusPoller for VectorIndexStatus<'_, V> {
    type Error = ServiceError;

    async fn poll_status(&self, handle: &str) -> Result<String, ServiceError> {
        let status = if self.indices.index_exists(handle).await? {
            INDEX_AVAILABLE
        } else {
            INDEX_MISSING
        };
        Ok(status.to_string())
    }
}

/// Create the index, wait until it is visible, then let it settle
pub async fn create_vector_index<V, S>(
    indices: &V,
    index_name: &str,
    body: &serde_json::Value,
    waiter: &AsyncOperationWaiter<S>,
    policy: &BackoffPolicy,
) -> Result<StepReport, ServiceError>
where
    V: VectorIndexApi + ?Sized,
    S: Sleeper,
{
    indices.create_index(index_name, body).await?;
    tracing::info!(index = %index_name, "Vector index creation requested");

    let poller = VectorIndexStatus::new(indices);
    let operation = Operation::new(
        OperationKind::VectorIndexCreation,
        index_name,
        &poller,
        VECTOR_INDEX_STATUSES,
    );
    let outcome = waiter.wait(&operation, policy).await?;

    if outcome.result.is_success() {
        tracing::info!(
            index = %index_name,
            settle_secs = INDEX_SETTLE_TIME.as_secs(),
            "Vector index available, waiting for it to settle"
        );
        waiter.sleeper().sleep(INDEX_SETTLE_TIME).await;
    }

    Ok(StepReport::new(OperationKind::VectorIndexCreation, index_name, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockIndices, RecordingSleeper};
    use crate::waiter::WaitResult;

    #[test]
    fn test_index_body() {
        let body = vector_index_body("bedrock-knowledge-base-default-vector", 1536);

        assert_eq!(body["settings"]["index.knn"], json!(true));
        assert_eq!(body["settings"]["index.knn.algo_param.ef_search"], json!(512));

        let vector = &body["mappings"]["properties"]["bedrock-knowledge-base-default-vector"];
        assert_eq!(vector["type"], "knn_vector");
        assert_eq!(vector["dimension"], 1536);
        assert_eq!(vector["method"]["engine"], "FAISS");
        assert_eq!(vector["method"]["space_type"], "innerproduct");
        assert_eq!(vector["method"]["parameters"]["m"], 16);

        let metadata = &body["mappings"]["properties"]["AMAZON_BEDROCK_METADATA"];
        assert_eq!(metadata["index"], json!(false));
    }

    #[tokio::test]
    async fn test_index_becomes_available() {
        let indices = MockIndices::new(&[false, false, true]);
        let waiter = AsyncOperationWaiter::with_sleeper(RecordingSleeper::default());
        let body = vector_index_body("vector", 1536);

        let report = create_vector_index(&indices, "kb-index", &body, &waiter, &BackoffPolicy::default())
            .await
            .unwrap();

        assert_eq!(report.outcome.result, WaitResult::Succeeded);
        assert_eq!(report.outcome.polls, 3);
        assert_eq!(indices.created(), vec!["kb-index".to_string()]);
        assert_eq!(
            waiter.sleeper().recorded(),
            vec![Duration::from_secs(5), Duration::from_secs(10), INDEX_SETTLE_TIME]
        );
    }

    #[tokio::test]
    async fn test_settle_time_follows_immediate_availability() {
        let indices = MockIndices::new(&[true]);
        let waiter = AsyncOperationWaiter::with_sleeper(RecordingSleeper::default());
        let body = vector_index_body("vector", 1536);

        let report = create_vector_index(&indices, "kb-index", &body, &waiter, &BackoffPolicy::default())
            .await
            .unwrap();

        assert_eq!(report.outcome.polls, 1);
        assert_eq!(waiter.sleeper().recorded(), vec![Duration::from_secs(60)]);
    }

    #[tokio::test]
    async fn test_index_never_appears() {
        let indices = MockIndices::new(&[false]);
        let waiter = AsyncOperationWaiter::with_sleeper(RecordingSleeper::default());
        let policy = BackoffPolicy::new().with_max_attempts(4);
        let body = vector_index_body("vector", 1536);

        let report = create_vector_index(&indices, "kb-index", &body, &waiter, &policy)
            .await
            .unwrap();

        assert_eq!(
            report.outcome.result,
            WaitResult::TimedOut(Some(INDEX_MISSING.to_string()))
        );
        assert!(!waiter.sleeper().recorded().contains(&INDEX_SETTLE_TIME));
    }
}
