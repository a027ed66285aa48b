//! Custom resource handler for the knowledge base vector index

use crate::config::VectorIndexConfig;
use crate::custom_resource::{
    complete, within_deadline, CustomResourceRequest, HandlerOutput, HttpResponseSender,
    InvocationContext, LambdaResponse, RequestType, ResponseSender,
};
use crate::error::ProvisionError;
use crate::operations::{create_vector_index, vector_index_body, OperationKind};
use crate::services::VectorIndexApi;
use crate::waiter::{AsyncOperationWaiter, BackoffPolicy, Sleeper, TokioSleeper};

pub struct IndexHandler<V, S = TokioSleeper, R = HttpResponseSender> {
    indices: V,
    waiter: AsyncOperationWaiter<S>,
    policy: BackoffPolicy,
    config: VectorIndexConfig,
    sender: R,
}

impl<V, S, R> IndexHandler<V, S, R>
where
    V: VectorIndexApi,
    S: Sleeper,
    R: ResponseSender,
{
    pub fn new(
        indices: V,
        waiter: AsyncOperationWaiter<S>,
        policy: BackoffPolicy,
        config: VectorIndexConfig,
        sender: R,
    ) -> Self {
        Self {
            indices,
            waiter,
            policy,
            config,
            sender,
        }
    }

    pub fn indices(&self) -> &V {
        &self.indices
    }

    pub fn sender(&self) -> &R {
        &self.sender
    }

    pub async fn handle(
        &self,
        request: &CustomResourceRequest,
        context: &InvocationContext,
    ) -> LambdaResponse {
        tracing::info!(
            request_type = %request.request_type,
            index = %self.config.index_name,
            collection = %self.config.collection_host,
            "Received vector index request"
        );

        let result = self.dispatch(request, context).await;
        complete(&self.sender, request, context, result).await
    }

    async fn dispatch(
        &self,
        request: &CustomResourceRequest,
        context: &InvocationContext,
    ) -> Result<HandlerOutput, ProvisionError> {
        let index_name = &self.config.index_name;

        match request.request_type {
            RequestType::Create => {
                let body = vector_index_body(&self.config.vector_field, self.config.dimension);
                within_deadline(context, OperationKind::VectorIndexCreation, async {
                    create_vector_index(&self.indices, index_name, &body, &self.waiter, &self.policy)
                        .await?
                        .into_result()
                })
                .await?;
                Ok(HandlerOutput::empty().with("IndexName", index_name.as_str()))
            }
            RequestType::Update => {
                tracing::info!("Update requires no action");
                Ok(HandlerOutput::empty())
            }
            RequestType::Delete => {
                match self.indices.delete_index(index_name).await {
                    Ok(()) => tracing::info!(index = %index_name, "Vector index deleted"),
                    Err(e) if e.is_not_found() => {
                        tracing::info!(index = %index_name, "Vector index already deleted")
                    }
                    Err(e) => return Err(e.into()),
                }
                Ok(HandlerOutput::empty())
            }
        }
    }
}
